use crate::core::{ReconcileError, RecordId, Result, SubItemId};
use std::fmt;
use std::str::FromStr;

pub const RECORD_PREFIX: &str = "record";
pub const SUB_OBJECT_PREFIX: &str = "subobject";
pub const SUB_ITEMS_PREFIX: &str = "subitems";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Scope {
    Top,
    SubObject,
    SubItem,
}

/// Location of a single field inside one record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldLocation {
    Top { field: String },
    SubObject { field: String },
    SubItem { sub_item_id: SubItemId, field: String },
}

impl FieldLocation {
    pub fn top(field: impl Into<String>) -> Self {
        Self::Top {
            field: field.into(),
        }
    }

    pub fn sub_object(field: impl Into<String>) -> Self {
        Self::SubObject {
            field: field.into(),
        }
    }

    pub fn sub_item(sub_item_id: impl Into<SubItemId>, field: impl Into<String>) -> Self {
        Self::SubItem {
            sub_item_id: sub_item_id.into(),
            field: field.into(),
        }
    }

    pub fn scope(&self) -> Scope {
        match self {
            Self::Top { .. } => Scope::Top,
            Self::SubObject { .. } => Scope::SubObject,
            Self::SubItem { .. } => Scope::SubItem,
        }
    }

    pub fn field(&self) -> &str {
        match self {
            Self::Top { field } | Self::SubObject { field } | Self::SubItem { field, .. } => field,
        }
    }

    pub fn sub_item_id(&self) -> Option<&str> {
        match self {
            Self::SubItem { sub_item_id, .. } => Some(sub_item_id.as_str()),
            _ => None,
        }
    }

    /// Wire form: `record.<field>`, `subobject.<field>` or
    /// `subitems.<subItemId>.<field>`.
    pub fn to_key(&self) -> String {
        match self {
            Self::Top { field } => format!("{RECORD_PREFIX}.{field}"),
            Self::SubObject { field } => format!("{SUB_OBJECT_PREFIX}.{field}"),
            Self::SubItem { sub_item_id, field } => {
                format!("{SUB_ITEMS_PREFIX}.{sub_item_id}.{field}")
            }
        }
    }
}

impl fmt::Display for FieldLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_key())
    }
}

/// A field location bound to the record it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath {
    pub record_id: RecordId,
    pub location: FieldLocation,
}

impl FieldPath {
    pub fn new(record_id: impl Into<RecordId>, location: FieldLocation) -> Self {
        Self {
            record_id: record_id.into(),
            location,
        }
    }

    pub fn scope(&self) -> Scope {
        self.location.scope()
    }

    pub fn key(&self) -> String {
        self.location.to_key()
    }
}

/// Every field of one scope at once. Servers report these as a bare prefix
/// with no field suffix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldGroup {
    Record,
    SubObject,
    AllSubItems,
    SubItem(SubItemId),
}

impl FieldGroup {
    pub fn covers(&self, location: &FieldLocation) -> bool {
        match (self, location) {
            (Self::Record, FieldLocation::Top { .. }) => true,
            (Self::SubObject, FieldLocation::SubObject { .. }) => true,
            (Self::AllSubItems, FieldLocation::SubItem { .. }) => true,
            (Self::SubItem(id), FieldLocation::SubItem { sub_item_id, .. }) => id == sub_item_id,
            _ => false,
        }
    }

    pub fn to_key(&self) -> String {
        match self {
            Self::Record => RECORD_PREFIX.to_string(),
            Self::SubObject => SUB_OBJECT_PREFIX.to_string(),
            Self::AllSubItems => SUB_ITEMS_PREFIX.to_string(),
            Self::SubItem(id) => format!("{SUB_ITEMS_PREFIX}.{id}"),
        }
    }
}

/// A parsed error key: either a group sentinel or one specific field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKey {
    Group(FieldGroup),
    Field(FieldLocation),
}

impl ErrorKey {
    /// Parses the wire form. Sub-item ids may not contain `.`; the first dot
    /// after the sub-item id starts the field name, and field names may
    /// themselves contain dots.
    pub fn parse(key: &str) -> Result<Self> {
        let invalid = || ReconcileError::InvalidFieldPath(key.to_string());

        let Some((prefix, rest)) = key.split_once('.') else {
            return match key {
                RECORD_PREFIX => Ok(Self::Group(FieldGroup::Record)),
                SUB_OBJECT_PREFIX => Ok(Self::Group(FieldGroup::SubObject)),
                SUB_ITEMS_PREFIX => Ok(Self::Group(FieldGroup::AllSubItems)),
                _ => Err(invalid()),
            };
        };

        if rest.is_empty() {
            return Err(invalid());
        }

        match prefix {
            RECORD_PREFIX => Ok(Self::Field(FieldLocation::top(rest))),
            SUB_OBJECT_PREFIX => Ok(Self::Field(FieldLocation::sub_object(rest))),
            SUB_ITEMS_PREFIX => match rest.split_once('.') {
                None => Ok(Self::Group(FieldGroup::SubItem(rest.to_string()))),
                Some((id, field)) if !id.is_empty() && !field.is_empty() => {
                    Ok(Self::Field(FieldLocation::sub_item(id, field)))
                }
                Some(_) => Err(invalid()),
            },
            _ => Err(invalid()),
        }
    }

    pub fn to_key(&self) -> String {
        match self {
            Self::Group(group) => group.to_key(),
            Self::Field(location) => location.to_key(),
        }
    }
}

impl FromStr for ErrorKey {
    type Err = ReconcileError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
