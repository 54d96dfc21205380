//! `socialcontext jobs ...`

use clap::{Args, Subcommand};
use socialcontext_core::SocialContextClient;
use socialcontext_domain::constants::{DEFAULT_BATCH_SIZE, MAX_BATCH_SIZE, MIN_BATCH_SIZE};
use socialcontext_domain::{ContentType, JobSpec};
use socialcontext_infra::config::load_profile;
use tracing::{info, instrument};

use super::{check_models, Reply};

#[derive(Debug, Subcommand)]
pub enum JobsAction {
    /// List batch jobs for the account.
    List,
    /// Show details for a job.
    Info {
        /// Job ID.
        job_id: String,
    },
    /// Submit a job for batch processing.
    Create(CreateJobArgs),
    /// Schedule a cancelled or failed job for execution.
    Run {
        /// The unique ID of the job.
        job_id: String,
    },
    /// Start an execution of a job by name.
    Execute {
        job_name: String,
    },
    /// Cancel a running job.
    Cancel {
        /// The unique ID of the job.
        job_id: String,
    },
    /// Delete a job.
    Delete {
        /// The unique ID of the job.
        job_id: String,
    },
}

/// Arguments for `jobs create`.
///
/// If no output path is given, the location of the input file is used. A
/// profile names an entry under `profiles` in `~/.socialcontext.json`; its
/// models and options are merged with the ones given here.
#[derive(Debug, Args)]
pub struct CreateJobArgs {
    /// File containing URLs. Must be readable by the batch system.
    pub input_file: String,

    /// Content type. Currently only news is supported.
    #[arg(long, default_value_t = ContentType::News)]
    pub content_type: ContentType,

    /// Location to write output files. Must be writeable by the batch system.
    #[arg(long)]
    pub output_path: Option<String>,

    #[arg(
        long,
        default_value_t = DEFAULT_BATCH_SIZE,
        help = format!(
            "Size of written data batches between {MIN_BATCH_SIZE} and {MAX_BATCH_SIZE}; \
             out of range values are coerced"
        )
    )]
    pub batch_size: u32,

    /// Read models and options from a named profile.
    #[arg(long)]
    pub profile: Option<String>,

    #[arg(long)]
    pub job_name: Option<String>,

    /// Content model (repeatable).
    #[arg(long = "content-model")]
    pub content_models: Vec<String>,

    /// Domain model (repeatable).
    #[arg(long = "domain-model")]
    pub domain_models: Vec<String>,

    /// Options reserved for administrative use (repeatable).
    #[arg(long = "option")]
    pub options: Vec<String>,
}

impl CreateJobArgs {
    fn into_spec(self) -> anyhow::Result<JobSpec> {
        let mut spec = JobSpec::new(self.input_file)
            .with_content_models(self.content_models)
            .with_domain_models(self.domain_models);
        spec.job_name = self.job_name;
        spec.output_path = self.output_path;
        spec.content_type = self.content_type;
        spec.batch_size = self.batch_size;
        spec.options = self.options;

        if let Some(name) = self.profile.as_deref() {
            spec.apply_profile(&load_profile(name)?);
            info!(profile = name, "merged job profile");
        }

        Ok(spec)
    }
}

pub async fn handle(action: JobsAction, client: &SocialContextClient) -> anyhow::Result<Reply> {
    let reply = match action {
        JobsAction::List => client.jobs().await?.into(),
        JobsAction::Info { job_id } => client.job(&job_id).await?.into(),
        JobsAction::Create(args) => create(client, args.into_spec()?).await?,
        JobsAction::Run { job_id } => client.run_job(&job_id).await?.into(),
        JobsAction::Execute { job_name } => client.execute_job(&job_name).await?.into(),
        JobsAction::Cancel { job_id } => client.cancel_job(&job_id).await?.into(),
        JobsAction::Delete { job_id } => client.delete_job(&job_id).await?.into(),
    };
    Ok(reply)
}

#[instrument(skip_all, fields(input_file = %spec.input_file))]
async fn create(client: &SocialContextClient, spec: JobSpec) -> anyhow::Result<Reply> {
    spec.validate()?;
    if !spec.content_models.is_empty() {
        check_models(client, &spec.content_models).await?;
    }
    Ok(client.create_job(&spec).await?.into())
}
