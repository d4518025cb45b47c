//! Spreadsheet report.
//!
//! Two sheets: every item of the current feed, and the items that
//! disappeared since the previous run.

use std::path::Path;

use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use tracing::info;

use crate::error::PersistenceError;
use crate::model::Item;
use crate::store::diff::DisappearedItem;

pub const CURRENT_SHEET: &str = "Current Items";
pub const DISAPPEARED_SHEET: &str = "Disappeared Items";
const DISAPPEARED_LABEL: &str = "DISAPPEARED";
const HEADERS: [&str; 4] = ["Section", "Name", "Price", "Status"];

fn fill_sheet<'a, I>(sheet: &mut Worksheet, name: &str, rows: I) -> Result<(), XlsxError>
where
    I: Iterator<Item = [&'a str; 4]>,
{
    sheet.set_name(name)?;

    let bold = Format::new().set_bold();
    for (col, header) in (0u16..).zip(HEADERS) {
        sheet.write_string_with_format(0, col, header, &bold)?;
    }

    for (row, cells) in (1u32..).zip(rows) {
        for (col, value) in (0u16..).zip(cells) {
            sheet.write_string(row, col, value)?;
        }
    }

    Ok(())
}

fn build(current: &[Item], disappeared: &[DisappearedItem]) -> Result<Workbook, XlsxError> {
    let mut workbook = Workbook::new();

    fill_sheet(
        workbook.add_worksheet(),
        CURRENT_SHEET,
        current
            .iter()
            .map(|i| [i.section.as_str(), i.name.as_str(), i.price.as_str(), i.status.as_str()]),
    )?;

    fill_sheet(
        workbook.add_worksheet(),
        DISAPPEARED_SHEET,
        disappeared.iter().map(|d| {
            [
                d.item.section.as_str(),
                d.item.name.as_str(),
                d.item.price.as_str(),
                DISAPPEARED_LABEL,
            ]
        }),
    )?;

    Ok(workbook)
}

pub fn write(path: &Path, current: &[Item], disappeared: &[DisappearedItem]) -> Result<(), PersistenceError> {
    let spreadsheet_err = |source| PersistenceError::Spreadsheet {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| PersistenceError::io(parent, e))?;
    }

    let mut workbook = build(current, disappeared).map_err(spreadsheet_err)?;
    workbook.save(path).map_err(spreadsheet_err)?;

    info!(
        current = current.len(),
        disappeared = disappeared.len(),
        path = %path.display(),
        "spreadsheet report written"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Status;

    fn item(name: &str) -> Item {
        Item {
            section: "Pizzas".to_string(),
            name: name.to_string(),
            price: "10".to_string(),
            description: None,
            status: Status::On,
        }
    }

    #[test]
    fn writes_xlsx_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.xlsx");
        let disappeared = vec![DisappearedItem {
            item: item("Sushi"),
            last_seen: "t".to_string(),
        }];

        write(&path, &[item("Margherita"), item("Calzone")], &disappeared).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        // xlsx is a zip container
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn empty_inputs_still_produce_both_sheets() {
        let workbook = build(&[], &[]);
        assert!(workbook.is_ok());
    }

    #[test]
    fn unwritable_destination_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        // the destination is an existing directory
        let result = write(dir.path(), &[item("Margherita")], &[]);
        assert!(result.is_err());
    }
}
