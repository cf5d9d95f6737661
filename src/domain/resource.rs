// src/domain/resource.rs
use crate::errors::ServerError;

/// The three metered utilities. Stored in SQLite as the lowercase string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Electricity,
    Water,
    Gas,
}

impl Resource {
    pub const ALL: [Resource; 3] = [Resource::Electricity, Resource::Water, Resource::Gas];

    pub fn as_str(self) -> &'static str {
        match self {
            Resource::Electricity => "electricity",
            Resource::Water => "water",
            Resource::Gas => "gas",
        }
    }

    /// Default measurement unit for ingested readings.
    pub fn unit(self) -> &'static str {
        match self {
            Resource::Electricity => "kWh",
            Resource::Water => "m3",
            Resource::Gas => "m3",
        }
    }

    pub fn parse(s: &str) -> Result<Resource, ServerError> {
        match s.trim().to_lowercase().as_str() {
            "electricity" => Ok(Resource::Electricity),
            "water" => Ok(Resource::Water),
            "gas" => Ok(Resource::Gas),
            other => Err(ServerError::BadRequest(format!(
                "unknown resource type: {other}"
            ))),
        }
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
