//! Typed record kinds and the generic CRUD surface.
//! Every persisted entity shares the base shape `{_id, createdAt,
//! updatedAt}`; kind-specific fields are flattened alongside it with
//! camelCase names, which is the on-disk compatibility surface. Rows are
//! validated against their kind at the store boundary on every decode.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::{AppError, AppResult};

use super::collections::{merge_patch, row_id, stamp_updated_at};
use super::{JsonMap, Store};

/// A stored entity: store-assigned identity and timestamps plus the fields
/// of its collection kind.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Record<K> {
    /// Opaque unique id, assigned once at creation, immutable, never reused.
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    /// Refreshed on every successful mutation; never precedes `created_at`.
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub fields: K,
}

/// A collection kind: the typed fields stored alongside the record base,
/// addressed by a fixed medium key.
pub trait Kind: Serialize + DeserializeOwned + Clone {
    const KEY: &'static str;
}

/// Authorization role carried by a user record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    Partner,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Partner => "partner",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "partner" => Ok(Role::Partner),
            other => Err(AppError::user("bad_role".to_string(), format!("unknown role '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct User {
    pub email: String,
    /// Argon2id PHC string; the store never holds a cleartext password.
    pub password_hash: String,
    pub role: Role,
    pub company_name: String,
    pub contact_person: String,
    pub phone: String,
    pub address: String,
    pub is_active: bool,
    pub total_spend: f64,
}

impl Kind for User {
    const KEY: &'static str = "users";
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Product {
    pub name: String,
    pub description: String,
    pub image_url: String,
    pub price: f64,
    pub is_active: bool,
}

impl Kind for Product {
    const KEY: &'static str = "products";
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Delivered,
    Cancelled,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderItem {
    pub product_id: String,
    pub quantity: u32,
    pub unit_price: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Order {
    /// References a user record; the store performs no referential check.
    pub partner_id: String,
    pub items: Vec<OrderItem>,
    pub total_amount: f64,
    pub status: OrderStatus,
}

impl Kind for Order {
    const KEY: &'static str = "orders";
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    #[default]
    Unpaid,
    Paid,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Invoice {
    pub order_id: String,
    pub partner_id: String,
    pub amount: f64,
    pub status: InvoiceStatus,
}

impl Kind for Invoice {
    const KEY: &'static str = "invoices";
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Milestone {
    pub milestone_amount: f64,
    pub reward_description: String,
    pub is_active: bool,
}

impl Kind for Milestone {
    const KEY: &'static str = "milestones";
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Notification {
    pub user_id: String,
    pub message: String,
    pub is_read: bool,
}

impl Kind for Notification {
    const KEY: &'static str = "notifications";
}

fn decode<K: Kind>(key: &str, row: &JsonMap) -> AppResult<Record<K>> {
    serde_json::from_value(JsonValue::Object(row.clone())).map_err(|e| {
        AppError::corrupt("bad_record".to_string(), format!("collection '{}': {}", key, e))
    })
}

fn encode_fields<K: Kind>(fields: &K) -> AppResult<JsonMap> {
    match serde_json::to_value(fields)? {
        JsonValue::Object(map) => Ok(map),
        other => Err(AppError::internal(
            "bad_kind".to_string(),
            format!("kind '{}' serialized to non-object {:?}", K::KEY, other),
        )),
    }
}

impl Store {
    /// All records of a kind in insertion order. An absent collection is an
    /// empty sequence, never an error.
    pub fn list<K: Kind>(&self) -> AppResult<Vec<Record<K>>> {
        self.read_rows(K::KEY)?.iter().map(|r| decode::<K>(K::KEY, r)).collect()
    }

    /// First record with matching id, or `None`.
    pub fn get<K: Kind>(&self, id: &str) -> AppResult<Option<Record<K>>> {
        match self.get_raw(K::KEY, id)? {
            Some(row) => Ok(Some(decode::<K>(K::KEY, &row)?)),
            None => Ok(None),
        }
    }

    /// All records satisfying the predicate, original order preserved. This
    /// is the relational lookup path; there is no index.
    pub fn query<K, P>(&self, pred: P) -> AppResult<Vec<Record<K>>>
    where
        K: Kind,
        P: Fn(&Record<K>) -> bool,
    {
        Ok(self.list::<K>()?.into_iter().filter(|r| pred(r)).collect())
    }

    /// Create a record under a freshly generated id and return it finalized.
    pub fn add<K: Kind>(&self, fields: K) -> AppResult<Record<K>> {
        let added = self.add_raw(K::KEY, encode_fields(&fields)?)?;
        decode::<K>(K::KEY, &added)
    }

    /// Create a record honoring its caller-supplied `id`/`created_at`
    /// (restore and import path). `updated_at` is still forced to now.
    pub fn add_record<K: Kind>(&self, record: Record<K>) -> AppResult<Record<K>> {
        let row = match serde_json::to_value(&record)? {
            JsonValue::Object(map) => map,
            other => {
                return Err(AppError::internal(
                    "bad_record".to_string(),
                    format!("record serialized to non-object {:?}", other),
                ))
            }
        };
        let added = self.add_raw(K::KEY, row)?;
        decode::<K>(K::KEY, &added)
    }

    /// Shallow-merge a JSON patch over the stored record: patch keys
    /// overwrite, unspecified fields persist, `updated_at` is forced to now.
    /// The merged row is validated against the kind before anything is
    /// persisted, so an invalid patch never reaches the medium. Returns
    /// `None` (and makes no change) when the id is absent.
    pub fn update<K: Kind>(&self, id: &str, patch: JsonMap) -> AppResult<Option<Record<K>>> {
        let mut rows = (*self.read_rows(K::KEY)?).clone();
        let Some(idx) = rows.iter().position(|r| row_id(r) == Some(id)) else {
            return Ok(None);
        };
        merge_patch(&mut rows[idx], patch);
        stamp_updated_at(&mut rows[idx])?;
        let record = decode::<K>(K::KEY, &rows[idx])?;
        self.write_rows(K::KEY, rows)?;
        Ok(Some(record))
    }

    /// Remove the record with matching id; see `delete_raw` for the result
    /// contract.
    pub fn delete<K: Kind>(&self, id: &str) -> AppResult<bool> {
        self.delete_raw(K::KEY, id)
    }
}

// Relational lookups used by the session layer and portal pages.
impl Store {
    /// First user whose email matches, in insertion order. Email uniqueness
    /// is a caller convention; duplicates resolve to the earliest record.
    pub fn user_by_email(&self, email: &str) -> AppResult<Option<Record<User>>> {
        Ok(self.query::<User, _>(|u| u.fields.email == email)?.into_iter().next())
    }

    pub fn orders_by_partner(&self, partner_id: &str) -> AppResult<Vec<Record<Order>>> {
        self.query::<Order, _>(|o| o.fields.partner_id == partner_id)
    }

    /// First invoice referencing the order, if any.
    pub fn invoice_by_order(&self, order_id: &str) -> AppResult<Option<Record<Invoice>>> {
        Ok(self.query::<Invoice, _>(|i| i.fields.order_id == order_id)?.into_iter().next())
    }

    pub fn invoices_by_partner(&self, partner_id: &str) -> AppResult<Vec<Record<Invoice>>> {
        self.query::<Invoice, _>(|i| i.fields.partner_id == partner_id)
    }
}
