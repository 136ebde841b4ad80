mod row;

pub use row::CustomDbRow;
