use accubid_lib::types::{Database, Project};
use accubid_lib::{ConnectionTestResult, DataObject};
use serde::Serialize;
use serde_json::Value;
use tabled::builder::Builder;
use tabled::{Table, Tabled};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Self {
        match value {
            "json" => OutputFormat::Json,
            _ => OutputFormat::Table,
        }
    }
}

#[derive(Tabled)]
struct DatabaseRow {
    #[tabled(rename = "Token")]
    token: String,
    #[tabled(rename = "Database")]
    database: String,
    #[tabled(rename = "Company")]
    company: String,
}

#[derive(Tabled)]
struct ProjectRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Number")]
    number: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    project_type: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Start")]
    start: String,
    #[tabled(rename = "End")]
    end: String,
    #[tabled(rename = "Branch")]
    branch: String,
}

#[derive(Tabled)]
struct ObjectRow {
    #[tabled(rename = "Object")]
    name: String,
    #[tabled(rename = "Module")]
    module: String,
    #[tabled(rename = "Required")]
    required: String,
    #[tabled(rename = "Optional")]
    optional: String,
}

/// Serializable description of a [`DataObject`] for `--output json`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectInfo {
    pub name: &'static str,
    pub module: String,
    pub required_params: &'static [&'static str],
    pub optional_params: &'static [&'static str],
}

impl From<DataObject> for ObjectInfo {
    fn from(object: DataObject) -> Self {
        Self {
            name: object.name(),
            module: object.module().to_string(),
            required_params: object.required_params(),
            optional_params: object.optional_params(),
        }
    }
}

// -- Row builders --

fn build_database_rows(databases: &[Database]) -> Vec<DatabaseRow> {
    databases
        .iter()
        .map(|d| DatabaseRow {
            token: d.token.clone(),
            database: d.database_name.clone(),
            company: d.company_name.clone(),
        })
        .collect()
}

fn build_project_rows(projects: &[Project]) -> Vec<ProjectRow> {
    projects
        .iter()
        .map(|p| ProjectRow {
            id: p.project_id.clone(),
            number: p.number.clone(),
            name: p.name.clone(),
            project_type: p.project_type.clone(),
            status: p.status.clone(),
            start: format_date(p.start_date.as_deref()),
            end: format_date(p.end_date.as_deref()),
            branch: p.managing_branch_name.clone(),
        })
        .collect()
}

fn build_object_rows(objects: &[DataObject]) -> Vec<ObjectRow> {
    objects
        .iter()
        .map(|o| ObjectRow {
            name: o.name().to_string(),
            module: o.module().to_string(),
            required: o.required_params().join(", "),
            optional: o.optional_params().join(", "),
        })
        .collect()
}

/// One column per key, in order of first appearance across records.
fn build_record_table(records: &[Value]) -> Table {
    let mut columns: Vec<String> = Vec::new();
    for record in records {
        if let Value::Object(map) = record {
            for key in map.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.clone());
                }
            }
        }
    }

    let mut builder = Builder::default();
    if columns.is_empty() {
        builder.push_record(["Value".to_string()]);
        for record in records {
            builder.push_record([format_cell(record)]);
        }
    } else {
        builder.push_record(columns.clone());
        for record in records {
            builder.push_record(
                columns
                    .iter()
                    .map(|c| record.get(c).map(format_cell).unwrap_or_default()),
            );
        }
    }
    builder.build()
}

// -- Table output --

pub fn print_databases_table(databases: &[Database]) {
    println!("{}", Table::new(build_database_rows(databases)));
}

pub fn print_projects_table(projects: &[Project]) {
    println!("{}", Table::new(build_project_rows(projects)));
}

pub fn print_objects_table(objects: &[DataObject]) {
    println!("{}", Table::new(build_object_rows(objects)));
}

pub fn print_records_table(records: &[Value]) {
    println!("{}", build_record_table(records));
}

pub fn print_connection_result(result: &ConnectionTestResult) {
    let marker = if result.success { "OK" } else { "FAILED" };
    println!("[{}] {} ({})", marker, result.message, result.status_code);
}

// -- JSON output --

pub fn print_json<T: serde::Serialize>(data: &T) {
    match serde_json::to_string_pretty(data) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize to JSON: {}", e),
    }
}

/// Trims an ISO timestamp to its date part.
fn format_date(value: Option<&str>) -> String {
    match value {
        Some(v) => v.split('T').next().unwrap_or(v).to_string(),
        None => "-".to_string(),
    }
}

fn format_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn load_databases_fixture() -> Vec<Database> {
        let json_str = include_str!("../../accubid_api/tests/fixtures/databases.json");
        serde_json::from_str(json_str).unwrap()
    }

    fn load_projects_fixture() -> Vec<Project> {
        let json_str = include_str!("../../accubid_api/tests/fixtures/projects_page.json");
        let resp: serde_json::Value = serde_json::from_str(json_str).unwrap();
        serde_json::from_value(resp["items"].clone()).unwrap()
    }

    // -- format helpers --

    #[test]
    fn test_format_date_strips_time() {
        assert_eq!(format_date(Some("2024-03-01T00:00:00")), "2024-03-01");
        assert_eq!(format_date(Some("2024-03-01")), "2024-03-01");
        assert_eq!(format_date(None), "-");
    }

    #[test]
    fn test_format_cell() {
        assert_eq!(format_cell(&json!(null)), "");
        assert_eq!(format_cell(&json!("abc")), "abc");
        assert_eq!(format_cell(&json!(12.5)), "12.5");
        assert_eq!(format_cell(&json!(true)), "true");
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!(OutputFormat::parse("json"), OutputFormat::Json);
        assert_eq!(OutputFormat::parse("table"), OutputFormat::Table);
        assert_eq!(OutputFormat::parse("anything"), OutputFormat::Table);
    }

    // -- Row builder tests --

    #[test]
    fn test_build_database_rows_mapping() {
        let rows = build_database_rows(&load_databases_fixture());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].token, "db-7f3a9c");
        assert_eq!(rows[0].database, "Main Estimating");
    }

    #[test]
    fn test_build_project_rows_mapping() {
        let rows = build_project_rows(&load_projects_fixture());
        assert_eq!(rows.len(), 2);

        let row = &rows[0];
        assert_eq!(row.id, "P-1001");
        assert_eq!(row.project_type, "Commercial");
        assert_eq!(row.start, "2024-03-01");
        assert_eq!(row.end, "-");
        assert_eq!(rows[1].branch, "Tacoma");
    }

    #[test]
    fn test_build_object_rows_lists_params() {
        let rows = build_object_rows(&DataObject::ALL);
        assert_eq!(rows.len(), 17);
        let ext = rows
            .iter()
            .find(|r| r.name == "extension-item-details-file-signal-r")
            .unwrap();
        assert_eq!(ext.required, "databaseToken, estimateId, connectionId");
        assert_eq!(ext.optional, "bidSummaryId");
        assert_eq!(ext.module, "Estimate");
    }

    // -- Table rendering --

    #[test]
    fn test_database_table_has_headers() {
        let table = Table::new(build_database_rows(&load_databases_fixture())).to_string();
        assert!(table.contains("Token"));
        assert!(table.contains("Company"));
        assert!(table.contains("Northwind Electrical"));
    }

    #[test]
    fn test_record_table_unions_columns() {
        let records = vec![json!({"id": "C-1", "name": "Main"}), json!({"id": "C-2", "status": "Open"})];
        let table = build_record_table(&records).to_string();
        let header = table.lines().nth(1).unwrap();
        let id = header.find("id").unwrap();
        let name = header.find("name").unwrap();
        let status = header.find("status").unwrap();
        assert!(id < name && name < status);
        assert!(table.contains("Open"));
    }

    #[test]
    fn test_record_table_scalars() {
        let table = build_record_table(&[json!("only")]).to_string();
        assert!(table.contains("Value"));
        assert!(table.contains("only"));
    }

    #[test]
    fn test_object_info_json() {
        let info = ObjectInfo::from(DataObject::Project);
        let value = serde_json::to_value(&info).unwrap();
        assert_eq!(value["name"], "project");
        assert_eq!(value["requiredParams"], json!(["databaseToken", "id"]));
    }
}
