//! Row access over a live cursor and the tabular structures bulk fills produce.

pub mod result_set;
pub mod row;

pub use result_set::{DataSet, FromDataSet, ResultSet, TableRow};
pub use row::{ColumnIndex, FromDbValue, RowAdapter};
