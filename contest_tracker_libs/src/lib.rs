pub mod cache;
pub mod contest;
pub mod memory;
pub mod page;
pub mod status;
pub mod store;

pub use contest_tracker_derive::ColumnList;
pub use store::ColumnList;

#[cfg(test)]
mod test {
    use crate::store::ColumnList;
    use contest_tracker_derive::ColumnList;

    #[allow(dead_code)]
    #[derive(ColumnList)]
    struct Row {
        id: i32,
        #[column(rename = "display_name")]
        name: String,
        #[column(skip)]
        cached: Vec<String>,
        r#type: String,
    }

    #[test]
    fn test_column_list() {
        assert_eq!(Row::column_list(), "id, display_name, type");
    }
}
