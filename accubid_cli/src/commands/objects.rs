use anyhow::Result;
use accubid_lib::DataObject;

use crate::output::{print_json, print_objects_table, ObjectInfo, OutputFormat};

pub fn run(format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => print_objects_table(&DataObject::ALL),
        OutputFormat::Json => {
            let infos: Vec<ObjectInfo> = DataObject::ALL.into_iter().map(ObjectInfo::from).collect();
            print_json(&infos);
        }
    }
    Ok(())
}
