mod cursor;
mod result_set;
mod row;

pub use cursor::BufferedCursor;
pub use result_set::ResultSet;
pub use row::FetchedRow;
