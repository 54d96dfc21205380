//! Classification model names
//!
//! [`Model`] is the set of models this client knows about at compile time.
//! The service may add or retire models, so callers that care validate
//! requested names against a [`ModelCatalog`] built from the live `models`
//! listing.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{Result, SocialContextError};

macro_rules! models {
    ($($variant:ident => $name:literal),+ $(,)?) => {
        /// Known classification model
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum Model {
            $(#[serde(rename = $name)] $variant,)+
        }

        impl Model {
            pub const ALL: &'static [Model] = &[$(Model::$variant,)+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)+
                }
            }
        }

        impl FromStr for Model {
            type Err = SocialContextError;

            fn from_str(s: &str) -> Result<Self> {
                match s.trim() {
                    $($name => Ok(Self::$variant),)+
                    other => Err(SocialContextError::InvalidRequest(format!(
                        "unknown model '{other}'"
                    ))),
                }
            }
        }
    };
}

models! {
    Antivax => "antivax",
    CrimeViolence => "crime_violence",
    Diversity => "diversity",
    Elite => "elite",
    Emerging => "emerging",
    FakeNews => "fake_news",
    FemaleSports => "female_sports",
    FetchError => "fetch_error",
    GenderEquality => "gender_equality",
    Injuries => "injuries",
    Latinx => "latinx",
    Lgbt => "lgbt",
    LowCred => "low_cred",
    MaleSports => "male_sports",
    Military => "military",
    OnlinePartisan => "online_partisan",
    Political => "political",
    Profanity => "profanity",
    Provax => "provax",
    RenewableEnergy => "renewable_energy",
    SexuallyExplicit => "sexually_explicit",
    Traditional => "traditional",
    Vice => "vice",
    Wire => "wire",
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of model names the service currently offers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelCatalog {
    names: BTreeSet<String>,
}

impl ModelCatalog {
    /// Build a catalog from a `models` response body.
    ///
    /// Accepts a bare array or an object wrapping one under `models`; each
    /// entry is either a name or an object carrying `name`.
    ///
    /// # Errors
    /// `RequestFailed` if the body has none of those shapes.
    pub fn from_response(body: &Value) -> Result<Self> {
        let entries = match body {
            Value::Array(items) => items,
            Value::Object(map) => match map.get("models") {
                Some(Value::Array(items)) => items,
                _ => return Err(unexpected_shape()),
            },
            _ => return Err(unexpected_shape()),
        };

        let names = entries
            .iter()
            .filter_map(|entry| match entry {
                Value::String(name) => Some(name.clone()),
                Value::Object(obj) => obj.get("name").and_then(Value::as_str).map(str::to_string),
                _ => None,
            })
            .collect();

        Ok(Self { names })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Offered names that have no [`Model`] variant in this build.
    pub fn unrecognized(&self) -> Vec<&str> {
        self.names().filter(|name| name.parse::<Model>().is_err()).collect()
    }

    /// Ensure every requested name is offered.
    ///
    /// # Errors
    /// `InvalidRequest` naming every unknown model.
    pub fn validate<S: AsRef<str>>(&self, requested: &[S]) -> Result<()> {
        let unknown: Vec<&str> = requested
            .iter()
            .map(AsRef::as_ref)
            .filter(|name| !self.contains(name))
            .collect();

        if unknown.is_empty() {
            Ok(())
        } else {
            Err(SocialContextError::InvalidRequest(format!(
                "unknown model(s): {}",
                unknown.join(", ")
            )))
        }
    }
}

fn unexpected_shape() -> SocialContextError {
    SocialContextError::RequestFailed("unexpected models response shape".to_string())
}
