//! Client and technician models

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use super::enums::ClientType;
use crate::{
    error::AppError,
    lifecycle::matcher::{normalize_contact, PersonFields, StoredPerson},
};

static CONTACT_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9][0-9 -]{5,19}$").expect("valid contact number regex"));

/// Fewest digits a contact number may carry once spacing is stripped
const MIN_CONTACT_DIGITS: usize = 6;

fn validate_contact_number(value: &str) -> Result<(), ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(());
    }

    let digits = normalize_contact(Some(value))
        .map_or(0, |c| c.bytes().filter(u8::is_ascii_digit).count());
    if CONTACT_NUMBER.is_match(value) && digits >= MIN_CONTACT_DIGITS {
        Ok(())
    } else {
        Err(ValidationError::new("contact_number")
            .with_message("Contact number must contain 6 to 20 digits".into()))
    }
}

fn validate_required_name(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::new("required").with_message("Name must not be blank".into()))
    } else {
        Ok(())
    }
}

/// Raw `clients` row
#[derive(Debug, Clone, FromRow)]
pub struct ClientRow {
    pub id: i32,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub contact_number: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub client_type: Option<i16>,
    pub crea_date: DateTime<Utc>,
}

/// Borrower of equipment (student or instructor)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Client {
    pub id: i32,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub contact_number: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub client_type: Option<ClientType>,
    pub crea_date: DateTime<Utc>,
}

impl TryFrom<ClientRow> for Client {
    type Error = AppError;

    fn try_from(row: ClientRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            first_name: row.first_name,
            middle_name: row.middle_name,
            last_name: row.last_name,
            contact_number: row.contact_number,
            email: row.email,
            address: row.address,
            client_type: row.client_type.map(ClientType::try_from).transpose()?,
            crea_date: row.crea_date,
        })
    }
}

/// Client details entered at a scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct ClientInput {
    #[validate(
        length(min = 1, max = 100, message = "First name is required"),
        custom(function = "validate_required_name")
    )]
    pub first_name: String,
    pub middle_name: Option<String>,
    #[validate(
        length(min = 1, max = 100, message = "Last name is required"),
        custom(function = "validate_required_name")
    )]
    pub last_name: String,
    #[validate(custom(function = "validate_contact_number"))]
    pub contact_number: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub address: Option<String>,
    pub client_type: Option<ClientType>,
}

/// Raw `technicians` row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Technician {
    pub id: i32,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub contact_number: Option<String>,
    pub email: Option<String>,
    pub shop_name: Option<String>,
    pub shop_address: Option<String>,
    pub crea_date: DateTime<Utc>,
}

/// Technician details entered when releasing or accepting maintenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct TechnicianInput {
    #[validate(
        length(min = 1, max = 100, message = "First name is required"),
        custom(function = "validate_required_name")
    )]
    pub first_name: String,
    pub middle_name: Option<String>,
    #[validate(
        length(min = 1, max = 100, message = "Last name is required"),
        custom(function = "validate_required_name")
    )]
    pub last_name: String,
    #[validate(custom(function = "validate_contact_number"))]
    pub contact_number: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub shop_name: Option<String>,
    pub shop_address: Option<String>,
}

macro_rules! person_fields {
    ($ty:ty, |$p:ident| $locator:expr) => {
        impl PersonFields for $ty {
            fn first_name(&self) -> &str {
                &self.first_name
            }
            fn middle_name(&self) -> Option<&str> {
                self.middle_name.as_deref()
            }
            fn last_name(&self) -> &str {
                &self.last_name
            }
            fn contact_number(&self) -> Option<&str> {
                self.contact_number.as_deref()
            }
            fn email(&self) -> Option<&str> {
                self.email.as_deref()
            }
            fn locator(&self) -> [Option<&str>; 2] {
                let $p = self;
                $locator
            }
        }
    };
}

person_fields!(Client, |p| [p.address.as_deref(), None]);
person_fields!(ClientInput, |p| [p.address.as_deref(), None]);
person_fields!(Technician, |p| [p.shop_name.as_deref(), p.shop_address.as_deref()]);
person_fields!(TechnicianInput, |p| [p.shop_name.as_deref(), p.shop_address.as_deref()]);

impl StoredPerson for Client {
    fn id(&self) -> i32 {
        self.id
    }
}

impl StoredPerson for Technician {
    fn id(&self) -> i32 {
        self.id
    }
}

/// Person details attached to a request, whichever table they belong to
#[derive(Debug, Clone, Copy)]
pub enum PersonInput<'a> {
    Client(&'a ClientInput),
    Technician(&'a TechnicianInput),
}
