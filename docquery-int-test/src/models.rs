use chrono::{DateTime, TimeZone, Utc};
use docquery::collection::ObjectId;
use docquery_derive::{Convertible, Model};
use fake::faker::address::en::{CityName, StreetName, ZipCode};
use fake::faker::chrono::en::DateTimeBetween;
use fake::faker::company::en::{Buzzword, CompanyName};
use fake::faker::name::en::Name;
use fake::Fake;

#[derive(Debug, Clone, Default, PartialEq, Convertible, Model)]
#[model(name = "products")]
#[converter(ignored = "cache")]
pub struct Product {
    #[field(name = "_id", omit_empty)]
    pub id: Option<ObjectId>,
    pub name: String,
    pub price: f64,
    #[field(name = "qty")]
    pub quantity: i32,
    pub tags: Vec<String>,
    pub address: Address,
    #[field(leaf)]
    pub status: Status,
    pub discount: Option<f64>,
    #[field(skip)]
    pub note: String,
    pub cache: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Convertible, Model)]
pub struct Address {
    pub street: String,
    pub city: String,
    #[field(name = "zip,omitempty")]
    pub zip_code: String,
}

#[derive(Debug, Clone, Default, PartialEq, Convertible)]
pub enum Status {
    #[default]
    Draft,
    Active,
    Discontinued {
        reason: String,
    },
    Replaced(String, i32),
}

/// A read-only view over [Product], used as a cast target.
#[derive(Debug, Clone, Default, PartialEq, Convertible)]
pub struct ProductSummary {
    pub name: String,
    #[field(name = "qty")]
    pub quantity: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Convertible, Model)]
pub struct OrderKey {
    pub shop: String,
    pub seq: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Convertible, Model)]
#[model(name = "orders")]
pub struct Order {
    #[field(name = "_id")]
    pub key: OrderKey,
    pub customer: String,
    pub total: f64,
    pub placed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Convertible, Model)]
pub struct Site {
    pub label: String,
    pub address: Address,
}

/// Three levels of records: the warehouse, its site and the site's address.
#[derive(Debug, Clone, Default, PartialEq, Convertible, Model)]
#[model(name = "warehouses")]
pub struct Warehouse {
    pub name: String,
    pub site: Site,
}

pub fn generate_address() -> Address {
    Address {
        street: StreetName().fake(),
        city: CityName().fake(),
        zip_code: ZipCode().fake(),
    }
}

pub fn generate_product() -> Product {
    Product {
        id: None,
        name: CompanyName().fake(),
        price: (1.0..500.0).fake(),
        quantity: (1..100).fake(),
        tags: vec![Buzzword().fake(), Buzzword().fake()],
        address: generate_address(),
        status: Status::Active,
        discount: None,
        note: String::new(),
        cache: Vec::new(),
    }
}

pub fn generate_order(shop: &str, seq: i64) -> Order {
    Order {
        key: OrderKey {
            shop: shop.to_string(),
            seq,
        },
        customer: Name().fake(),
        total: (10.0..1000.0).fake(),
        placed_at: Some(placed_at()),
    }
}

fn placed_at() -> DateTime<Utc> {
    let start = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).single().unwrap_or_default();
    let end = Utc.with_ymd_and_hms(2025, 12, 31, 0, 0, 0).single().unwrap_or_default();
    DateTimeBetween(start, end).fake()
}
