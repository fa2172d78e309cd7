//! Fixed vocabulary of the TPC-DS benchmark data set.

/// The 24 TPC-DS tables produced by dsdgen and created on each cluster.
pub const TPC_DS_TABLES: [&str; 24] = [
    "call_center",
    "catalog_page",
    "catalog_returns",
    "catalog_sales",
    "customer",
    "customer_address",
    "customer_demographics",
    "date_dim",
    "household_demographics",
    "income_band",
    "inventory",
    "item",
    "promotion",
    "reason",
    "ship_mode",
    "store",
    "store_returns",
    "store_sales",
    "time_dim",
    "warehouse",
    "web_page",
    "web_returns",
    "web_sales",
    "web_site",
];

/// Storage formats the source data is converted into before upload.
pub const DATA_FORMATS: [&str; 5] = ["csv", "json", "pipe", "orc", "parquet"];

/// Default data volumes, in gigabytes.
pub const DEFAULT_SCALE_FACTORS: [u32; 2] = [1, 10];
