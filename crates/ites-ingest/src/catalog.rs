//! Built-in reference datasets
//!
//! What the verification suite queries: the Tableau TestV1 tables, the SQL QA
//! CSVs, the Kibana sample data and three collections derived from the QA data
//! with stricter schemas.

use crate::config::LoaderConfig;
use crate::error::Result;
use crate::fetcher::Resource;
use serde_json::{json, Value};

pub const CALCS_INDEX: &str = "calcs";
pub const STAPLES_INDEX: &str = "staples";
pub const BATTERS_INDEX: &str = "batters";
pub const LIBRARY_INDEX: &str = "library";
pub const EMPLOYEES_INDEX: &str = "employees";
pub const LOGS_UL_INDEX: &str = "logs_unsigned_long";
pub const LIB_TEST_INDEX: &str = "library_test";
pub const EMP_TEST_INDEX: &str = "employees_test";
pub const LOGS_UL_TEST_INDEX: &str = "logs_unsigned_long_test";
pub const FLIGHTS_INDEX: &str = "kibana_sample_data_flights";
pub const ECOMMERCE_INDEX: &str = "kibana_sample_data_ecommerce";
pub const LOGS_INDEX: &str = "kibana_sample_data_logs";

/// Function whose call sites hold the protocol test cases
pub const PROTO_TEST_FUNCTION: &str = "assertQuery";

/// Where a dataset's documents come from
#[derive(Debug, Clone)]
pub enum DatasetSource {
    /// Headed CSV, normalized into sparse documents
    Csv(Resource),
    /// Gzipped JSON-lines plus a mapping script translated into the template
    JsonLines { data: Resource, mappings: Resource },
    /// Server-side copy of an already loaded collection into an explicit schema
    Derived { source: String, schema: Value },
}

#[derive(Debug, Clone)]
pub struct DatasetSpec {
    /// Dataset and collection name
    pub name: String,
    pub source: DatasetSource,
    pub template: Option<Value>,
    pub pipeline: Option<Value>,
}

impl DatasetSpec {
    pub fn csv(name: &str, resource: Resource) -> Self {
        Self {
            name: name.to_string(),
            source: DatasetSource::Csv(resource),
            template: None,
            pipeline: None,
        }
    }

    pub fn json_lines(name: &str, data: Resource, mappings: Resource) -> Self {
        Self {
            name: name.to_string(),
            source: DatasetSource::JsonLines { data, mappings },
            template: None,
            pipeline: None,
        }
    }

    pub fn derived(name: &str, source: &str, schema: Value) -> Self {
        Self {
            name: name.to_string(),
            source: DatasetSource::Derived {
                source: source.to_string(),
                schema,
            },
            template: None,
            pipeline: None,
        }
    }

    pub fn with_template(mut self, template: Value) -> Self {
        self.template = Some(template);
        self
    }

    pub fn with_pipeline(mut self, pipeline: Value) -> Self {
        self.pipeline = Some(pipeline);
        self
    }

    pub fn template_name(&self) -> String {
        format!("{}_template", self.name)
    }

    pub fn pipeline_name(&self) -> String {
        format!("parse_{}", self.name)
    }
}

/// The datasets loaded by every run, in load order
///
/// Derived collections follow their sources.
pub fn builtin_datasets(config: &LoaderConfig) -> Result<Vec<DatasetSpec>> {
    let tableau = &config.tableau_base_url;
    let es = &config.es_dataset_base_url;

    let mut datasets = vec![
        DatasetSpec::csv(CALCS_INDEX, Resource::new(tableau, "Calcs_headers.csv")?)
            .with_template(calcs_template())
            .with_pipeline(calcs_pipeline()),
        DatasetSpec::csv(STAPLES_INDEX, Resource::new(tableau, "Staples_utf8_headers.csv")?)
            .with_template(staples_template()),
        DatasetSpec::csv(BATTERS_INDEX, Resource::new(tableau, "Batters_headers.csv")?)
            .with_template(batters_template()),
        DatasetSpec::csv(LIBRARY_INDEX, Resource::new(es, "library.csv")?),
        DatasetSpec::csv(EMPLOYEES_INDEX, Resource::new(es, "employees.csv")?),
        DatasetSpec::csv(LOGS_UL_INDEX, Resource::new(es, "logs_unsigned_long.csv")?)
            .with_template(logs_unsigned_long_template()),
        DatasetSpec::derived(LIB_TEST_INDEX, LIBRARY_INDEX, library_test_schema()),
        DatasetSpec::derived(EMP_TEST_INDEX, EMPLOYEES_INDEX, employees_test_schema()),
        DatasetSpec::derived(LOGS_UL_TEST_INDEX, LOGS_UL_INDEX, logs_unsigned_long_test_schema()),
    ];

    for (index, sample) in [
        (FLIGHTS_INDEX, "flights"),
        (ECOMMERCE_INDEX, "ecommerce"),
        (LOGS_INDEX, "logs"),
    ] {
        datasets.push(kibana_sample(config, index, sample)?);
    }

    Ok(datasets)
}

fn kibana_sample(config: &LoaderConfig, index: &str, sample: &str) -> Result<DatasetSpec> {
    let base = &config.kibana_base_url;
    let data = Resource::new(base, &format!("{}/{}.json.gz", sample, sample))?;
    let mappings = Resource::new(base, &format!("{}/field_mappings.js", sample))?
        .with_offline_name(format!("{}_field_mappings.js", sample));
    Ok(DatasetSpec::json_lines(index, data, mappings))
}

/// Template envelope shared by the explicit schemas
fn template(pattern: &str, properties: Value) -> Value {
    json!({
        "index_patterns": format!("{}*", pattern),
        "settings": { "number_of_shards": 1 },
        "mappings": { "properties": properties },
    })
}

fn typed(fields: &[&str], ty: &str) -> Vec<(String, Value)> {
    fields
        .iter()
        .map(|name| (name.to_string(), json!({ "type": ty })))
        .collect()
}

const DATETIME_FORMAT: &str = "yyyy-MM-dd' 'HH:mm:ss";

pub fn calcs_template() -> Value {
    let mut props = serde_json::Map::new();
    props.extend(typed(&["key", "str0", "str1", "str2", "str3", "datetime1", "zzz"], "keyword"));
    props.extend(typed(&["num0", "num1", "num2", "num3", "num4"], "double"));
    props.extend(typed(&["int0", "int1", "int2", "int3"], "integer"));
    props.extend(typed(&["bool0", "bool1", "bool2", "bool3"], "boolean"));
    props.extend(typed(&["date0", "date1", "date2", "date3"], "date"));
    props.insert("time0".into(), json!({ "type": "date", "format": DATETIME_FORMAT }));
    props.insert("time1".into(), json!({ "type": "date", "format": "hour_minute_second" }));
    props.insert("datetime0".into(), json!({ "type": "date", "format": DATETIME_FORMAT }));
    template(CALCS_INDEX, Value::Object(props))
}

/// Coerces the `bool*` columns and the `NULL` sentinel at write time
pub fn calcs_pipeline() -> Value {
    let mut source = String::from(
        "for (def key : new ArrayList(ctx.keySet())) { if (ctx[key] == 'NULL') { ctx[key] = null; } }\n",
    );
    for n in 0..4 {
        source.push_str(&format!(
            "if (ctx.bool{n} != null) {{ ctx.bool{n} = ctx.bool{n} == \"0\" ? false : true; }}\n"
        ));
    }

    json!({
        "description": "Parsing the Calcs lines",
        "processors": [
            { "script": { "lang": "painless", "source": source } }
        ],
    })
}

pub fn staples_template() -> Value {
    let mut props = serde_json::Map::new();
    props.extend(typed(
        &[
            "Ship Priority", "Order Priority", "Order Status", "Ship Mode", "Employee Name",
            "Employee Dept", "Manager Name", "Customer Name", "Customer State",
            "Call Center Region", "Customer Segment", "Prod Type1", "Prod Type2", "Prod Type3",
            "Prod Type4", "Product Name", "Product Container", "Ship Promo", "Supplier Name",
            "Supplier Region", "Supplier State", "Order ID", "Order Quarter", "Product ID",
            "Product In Stock", "Market Segment",
        ],
        "keyword",
    ));
    props.extend(typed(
        &[
            "Order Quantity", "Sales Total", "Discount", "Tax Rate", "Fill Time", "Gross Profit",
            "Price", "Ship Handle Cost", "Employee Yrs Exp", "Employee Salary",
            "Customer Balance", "Supplier Balance", "Product Base Margin", "Receive Time",
            "Ship Charge", "Total Cycle Time",
        ],
        "double",
    ));
    props.extend(typed(
        &["Item Count", "Order Year", "Order Month", "Order Day", "PID"],
        "integer",
    ));
    for field in ["Order Date", "Received Date", "Ship Date"] {
        props.insert(field.into(), json!({ "type": "date", "format": DATETIME_FORMAT }));
    }
    template(STAPLES_INDEX, Value::Object(props))
}

pub fn batters_template() -> Value {
    let mut props = serde_json::Map::new();
    props.extend(typed(&["Player", "Team", "League"], "keyword"));
    props.extend(typed(
        &[
            "Year", "Games", "AB", "R", "H", "Doubles", "Triples", "HR", "RBI", "SB", "CS", "BB",
            "SO", "IBB", "HBP", "SH", "SF", "GIDP",
        ],
        "integer",
    ));
    template(BATTERS_INDEX, Value::Object(props))
}

pub fn logs_unsigned_long_template() -> Value {
    template(
        LOGS_UL_INDEX,
        json!({
            "@timestamp": { "type": "date" },
            "bytes_in": { "type": "unsigned_long" },
            "bytes_out": { "type": "unsigned_long" },
            "status": { "type": "keyword" },
        }),
    )
}

/// Index body for `PUT /library_test`
pub fn library_test_schema() -> Value {
    json!({
        "mappings": {
            "properties": {
                "name": { "type": "keyword" },
                "author": { "type": "keyword" },
                "release_date": { "type": "date" },
                "page_count": { "type": "integer" },
            }
        }
    })
}

/// Index body for `PUT /employees_test`
pub fn employees_test_schema() -> Value {
    json!({
        "mappings": {
            "properties": {
                "birth_date": { "type": "date" },
                "emp_no": { "type": "integer" },
                "first_name": { "type": "keyword" },
                "gender": { "type": "keyword" },
                "hire_date": { "type": "date" },
                "languages": { "type": "integer" },
                "last_name": { "type": "keyword" },
                "salary": { "type": "integer" },
            }
        }
    })
}

/// Index body for `PUT /logs_unsigned_long_test`
pub fn logs_unsigned_long_test_schema() -> Value {
    json!({
        "mappings": {
            "properties": {
                "@timestamp": { "type": "date" },
                "bytes_in": { "type": "unsigned_long" },
                "bytes_out": { "type": "unsigned_long" },
                "status": { "type": "keyword" },
            }
        }
    })
}
