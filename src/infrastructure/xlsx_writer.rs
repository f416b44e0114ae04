//! Excel 写入 - 基础设施层
//!
//! 第 1、2 行是两级表头，数据从第 3 行开始

use std::path::Path;

use tracing::debug;

use crate::error::ExportError;
use crate::services::exporter::ResultTable;

pub const SHEET_NAME: &str = "Student Results";

const HEADER_FILL: &str = "FFD7E4BC";
const COLUMN_WIDTH: f64 = 15.0;
const FIRST_DATA_ROW: u32 = 3;

/// 把表格写入 xlsx 文件
pub fn write_xlsx(table: &ResultTable, path: &Path) -> Result<(), ExportError> {
    let write_error = |reason: String| ExportError::Write {
        path: path.display().to_string(),
        reason,
    };

    let mut book = umya_spreadsheet::new_file();
    let sheet = book
        .get_sheet_mut(&0)
        .ok_or_else(|| write_error("工作簿缺少默认工作表".to_string()))?;
    sheet.set_name(SHEET_NAME);

    for (index, column) in table.columns().iter().enumerate() {
        let col = index as u32 + 1;
        sheet.get_cell_mut((col, 1)).set_value_string(column.field.clone());
        sheet.get_cell_mut((col, 2)).set_value_string(column.detail.clone());
        for header_row in [1, 2] {
            let style = sheet.get_style_mut((col, header_row));
            style.get_font_mut().set_bold(true);
            style.set_background_color(HEADER_FILL);
        }
        sheet
            .get_column_dimension_by_number_mut(&col)
            .set_width(COLUMN_WIDTH);
    }

    for (offset, row) in table.rows().iter().enumerate() {
        let row_number = FIRST_DATA_ROW + offset as u32;
        for (index, value) in row.iter().enumerate() {
            let cell = sheet.get_cell_mut((index as u32 + 1, row_number));
            let number = table.columns()[index]
                .is_numeric()
                .then(|| value.parse::<f64>().ok())
                .flatten();
            match number {
                Some(n) => {
                    cell.set_value_number(n);
                }
                None => {
                    cell.set_value_string(value.clone());
                }
            }
        }
    }

    debug!(
        "写入 {} 列 x {} 行到 {}",
        table.columns().len(),
        table.rows().len(),
        path.display()
    );

    umya_spreadsheet::writer::xlsx::write(&book, path).map_err(|e| write_error(e.to_string()))
}
