use crate::error::ExtractError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DATETIME_COLUMN: &str = "DateTime";
pub const RESOLUTION_COLUMN: &str = "ResolutionCode";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnavailabilityKind {
    Generation,
    Production,
}

/// Logical category of ENTSO-E data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DatasetKind {
    Generation,
    /// Cross-border physical flows.
    Import,
    Capacities,
    Unavailability(UnavailabilityKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AreaLevel {
    /// Country
    Cty,
    /// Control area
    Cta,
}

impl AreaLevel {
    pub fn code(&self) -> &'static str {
        match self {
            AreaLevel::Cty => "CTY",
            AreaLevel::Cta => "CTA",
        }
    }
}

/// Columns of an outage record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutageFields {
    pub nominal: &'static str,
    pub available: &'static str,
    pub start: &'static str,
    pub end: &'static str,
    pub version: &'static str,
    pub status: &'static str,
    pub resource_id: &'static str,
    pub mrid: &'static str,
    pub outage_type: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueFields {
    Scalar(&'static str),
    Outage(OutageFields),
}

/// Physical roles of the columns of one dataset kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRoles {
    pub destination_key: &'static str,
    pub origin_key: &'static str,
    pub values: ValueFields,
    pub area_qualifier: &'static str,
    pub area_level: AreaLevel,
}

const UNAVAILABILITY_FIELDS: OutageFields = OutageFields {
    nominal: "InstalledCapacity",
    available: "AvailableCapacity",
    start: "StartOutage",
    end: "EndOutage",
    version: "Version",
    status: "Status",
    resource_id: "PowerResourceEIC",
    mrid: "MRID",
    outage_type: "Type",
};

impl DatasetKind {
    pub fn field_roles(&self) -> FieldRoles {
        match self {
            DatasetKind::Import => FieldRoles {
                destination_key: "InMapCode",
                origin_key: "OutMapCode",
                values: ValueFields::Scalar("FlowValue"),
                area_qualifier: "OutAreaTypeCode",
                area_level: AreaLevel::Cty,
            },
            DatasetKind::Generation => FieldRoles {
                destination_key: "MapCode",
                origin_key: "ProductionType",
                values: ValueFields::Scalar("ActualGenerationOutput"),
                area_qualifier: "AreaTypeCode",
                area_level: AreaLevel::Cty,
            },
            DatasetKind::Capacities => FieldRoles {
                destination_key: "MapCode",
                origin_key: "ProductionType",
                values: ValueFields::Scalar("AggregatedInstalledCapacity"),
                area_qualifier: "AreaTypeCode",
                area_level: AreaLevel::Cty,
            },
            DatasetKind::Unavailability(_) => FieldRoles {
                destination_key: "MapCode",
                origin_key: "ProductionType",
                values: ValueFields::Outage(UNAVAILABILITY_FIELDS),
                area_qualifier: "AreaTypeCode",
                area_level: AreaLevel::Cta,
            },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetKind::Generation => "generation",
            DatasetKind::Import => "import",
            DatasetKind::Capacities => "capacities",
            DatasetKind::Unavailability(UnavailabilityKind::Generation) => "unavailabilities_gen",
            DatasetKind::Unavailability(UnavailabilityKind::Production) => "unavailabilities_prod",
        }
    }

    pub fn is_pivotable(&self) -> bool {
        matches!(self.field_roles().values, ValueFields::Scalar(_))
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatasetKind {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "generation" => Ok(DatasetKind::Generation),
            "import" => Ok(DatasetKind::Import),
            "capacities" => Ok(DatasetKind::Capacities),
            "unavailabilities_gen" => Ok(DatasetKind::Unavailability(UnavailabilityKind::Generation)),
            "unavailabilities_prod" => Ok(DatasetKind::Unavailability(UnavailabilityKind::Production)),
            other => Err(ExtractError::UnsupportedKind(other.to_string())),
        }
    }
}

impl FieldRoles {
    /// Columns kept after loading, in projection order.
    pub fn required_columns(&self) -> Vec<&'static str> {
        match self.values {
            ValueFields::Scalar(value) => vec![
                DATETIME_COLUMN,
                self.destination_key,
                RESOLUTION_COLUMN,
                self.origin_key,
                value,
            ],
            ValueFields::Outage(fields) => vec![
                self.destination_key,
                self.origin_key,
                fields.nominal,
                fields.available,
                fields.start,
                fields.end,
                fields.version,
                fields.status,
                fields.resource_id,
                fields.mrid,
                fields.outage_type,
            ],
        }
    }

    /// Columns read as 32-bit floats.
    pub fn quantity_columns(&self) -> Vec<&'static str> {
        match self.values {
            ValueFields::Scalar(value) => vec![value],
            ValueFields::Outage(fields) => vec![fields.nominal, fields.available],
        }
    }

    pub fn status_column(&self) -> Option<&'static str> {
        match self.values {
            ValueFields::Scalar(_) => None,
            ValueFields::Outage(fields) => Some(fields.status),
        }
    }
}
