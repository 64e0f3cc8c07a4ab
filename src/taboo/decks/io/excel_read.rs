use std::path::Path;

use calamine::{DataType, Range, Reader, Xlsx, open_workbook};

use crate::taboo::decks::error::{DeckError, Result};
use crate::taboo::decks::io::{TabMeta, WorkbookMeta};
use crate::taboo::decks::model::UNTITLED_WORKBOOK;
use crate::taboo::decks::parse::CellMatrix;

/// Lists the worksheets of an `.xlsx` file. The sheet index doubles as the
/// numeric tab id and the file stem as the workbook title.
pub fn read_workbook_meta(path: &Path) -> Result<WorkbookMeta> {
    let workbook: Xlsx<_> = open_workbook(path)?;

    let tabs = workbook
        .sheet_names()
        .iter()
        .enumerate()
        .map(|(index, name)| TabMeta {
            title: name.clone(),
            gid: index as i64,
        })
        .collect();

    let title = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| UNTITLED_WORKBOOK.to_string());

    Ok(WorkbookMeta {
        sheet_id: path.display().to_string(),
        title,
        tabs,
    })
}

/// Reads one worksheet into a row-major matrix anchored at cell A1.
pub fn read_sheet_values(path: &Path, sheet: &str) -> Result<CellMatrix> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let range = read_required_sheet(&mut workbook, sheet)?;
    Ok(range_to_matrix(&range))
}

fn read_required_sheet<R: std::io::Read + std::io::Seek>(
    workbook: &mut Xlsx<R>,
    name: &str,
) -> Result<Range<DataType>> {
    let range_result = workbook
        .worksheet_range(name)
        .ok_or_else(|| DeckError::InvalidArgument(format!("missing sheet '{name}'")))?;
    let range = range_result.map_err(DeckError::from)?;
    Ok(range)
}

fn range_to_matrix(range: &Range<DataType>) -> CellMatrix {
    // Ranges start at the first used cell rather than at A1.
    let (row_offset, col_offset) = range
        .start()
        .map(|(row, col)| (row as usize, col as usize))
        .unwrap_or((0, 0));

    let mut rows: CellMatrix = vec![Vec::new(); row_offset];
    for row in range.rows() {
        let mut cells = vec![String::new(); col_offset];
        cells.extend(row.iter().map(|cell| cell_to_string(Some(cell))));
        rows.push(cells);
    }
    rows
}

fn cell_to_string(cell: Option<&DataType>) -> String {
    match cell {
        Some(DataType::String(value)) => value.clone(),
        Some(DataType::Float(value)) => value.to_string(),
        Some(DataType::Int(value)) => value.to_string(),
        Some(DataType::Bool(value)) => value.to_string(),
        Some(DataType::Empty) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
