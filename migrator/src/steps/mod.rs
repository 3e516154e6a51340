pub mod add_nullable_column;
pub mod backfill;
pub mod concurrent_index;
pub mod default_expr;
pub mod drop_column;
pub mod not_null;
pub mod rename_column;

pub use add_nullable_column::AddNullableColumn;
pub use backfill::BackfillColumn;
pub use concurrent_index::ConcurrentIndexBuild;
pub use default_expr::AttachDefault;
pub use drop_column::DropColumn;
pub use not_null::AttachNotNull;
pub use rename_column::RenameColumn;

use crate::step::MigrationStep;

/// Builds the four-step sequence that is the canonical pattern for
/// introducing a non-nullable column with a default. Each step is
/// individually safe; chained they add a
/// NOT NULL + DEFAULT column without ever holding an exclusive lock long
/// enough to impact online traffic.
pub fn safe_add_column_with_default(
    table: impl Into<String>,
    column: impl Into<String>,
    sql_type: impl Into<String>,
    default_literal: impl Into<String>,
) -> Vec<Box<dyn MigrationStep>> {
    let table = table.into();
    let column = column.into();
    let sql_type = sql_type.into();
    let default_literal = default_literal.into();

    vec![
        Box::new(AddNullableColumn::new(&table, &column, &sql_type)),
        Box::new(BackfillColumn::new(&table, &column, &default_literal)),
        Box::new(AttachNotNull::new(&table, &column)),
        Box::new(AttachDefault::new(&table, &column, &default_literal)),
    ]
}
