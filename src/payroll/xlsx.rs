use std::{
    fs,
    path::{Path, PathBuf},
};

use rust_decimal::{prelude::ToPrimitive as _, Decimal};
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use thiserror::Error;
use tracing::info;

use crate::payroll::sheet::{Cell, PayrollTable};

const MONEY_FORMAT: &str = "0.00";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("unable to prepare export directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("unable to write workbook: {0}")]
    Xlsx(#[from] XlsxError),
    #[error("amount {0} cannot be written as a number")]
    Amount(Decimal),
}

/// Writes payroll tables as `.xlsx` workbooks into one directory
#[derive(Debug, Clone)]
pub struct SheetWriter {
    dir: PathBuf,
}

impl SheetWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `<site name> <month name> <year>.xlsx`
    pub fn file_name(table: &PayrollTable) -> String {
        let site_name: String = table.site_name.chars()
            .map(|c| match c {
                '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
                c => c,
            })
            .collect();

        format!("{} {} {}.xlsx", site_name.trim(), table.month.name(), table.month.year())
    }

    pub fn write(&self, table: &PayrollTable) -> Result<PathBuf, ExportError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(Self::file_name(table));

        let money_format = Format::new().set_num_format(MONEY_FORMAT);
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();

        for (row, cells) in table.grid().iter().enumerate() {
            for (col, cell) in cells.iter().enumerate() {
                let (row, col) = (row as u32, col as u16);

                match cell {
                    Cell::Empty => {}
                    Cell::Text(text) => {
                        worksheet.write_string(row, col, text)?;
                    }
                    Cell::Integer(value) => {
                        worksheet.write_number(row, col, *value as f64)?;
                    }
                    Cell::Money(amount) => {
                        let value = amount.to_f64().ok_or(ExportError::Amount(*amount))?;
                        worksheet.write_number_with_format(row, col, value, &money_format)?;
                    }
                }
            }
        }

        workbook.save(&path)?;
        info!(path = %path.display(), site = %table.site_name, month = %table.month, "payroll sheet written");

        Ok(path)
    }

    pub fn write_all(&self, tables: &[PayrollTable]) -> Result<Vec<PathBuf>, ExportError> {
        tables.iter().map(|table| self.write(table)).collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use rust_decimal_macros::dec;

    use super::*;
    use crate::{
        entity::sea_orm_active_enums::PaymentMethod,
        payroll::{aggregate::tests::record, sheet::{build_sheets, Payee}},
        utils::YearMonth,
    };

    fn tables() -> Vec<PayrollTable> {
        let month = YearMonth::new(2025, 3).unwrap();
        let mut shift = record(1, 1, 1, 12, dec!(180.50));
        shift.date = month.first_day();

        let payees = HashMap::from([(1, Payee { name: "Petrov".to_owned(), payment_method: PaymentMethod::ToCard })]);
        let sites = HashMap::from([(1, "Mall: north/gate".to_owned())]);

        build_sheets(month, &[shift], &[], &payees, &sites)
    }

    #[test]
    fn test_file_name() {
        let tables = tables();

        assert_eq!(SheetWriter::file_name(&tables[0]), "Mall_ north_gate March 2025.xlsx");
    }

    #[test]
    fn test_write_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let writer = SheetWriter::new(dir.path().join("exports"));

        let paths = writer.write_all(&tables()).unwrap();

        assert_eq!(paths.len(), 1);
        assert!(paths[0].starts_with(writer.dir()));
        assert!(paths[0].is_file());
        assert!(fs::metadata(&paths[0]).unwrap().len() > 0);
    }
}
