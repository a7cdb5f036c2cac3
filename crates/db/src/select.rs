/// Column ordering applied to a read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

/// Row filter applied to a read. Only equality is needed so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    Eq { column: String, value: String },
}

/// A read against one table.
///
/// ```
/// use shelf_db::Select;
///
/// let select = Select::table("books")
///     .columns("*, authors(name)")
///     .order("publish_date", false)
///     .range(10, 19)
///     .eq("author_id", "42");
///
/// assert_eq!(select.offset_limit(), Some((10, 10)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Select {
    table: String,
    columns: String,
    orders: Vec<Order>,
    filters: Vec<Filter>,
    range: Option<(u64, u64)>,
}

impl Select {
    /// Start a read of every column of `table`.
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: "*".to_string(),
            orders: Vec::new(),
            filters: Vec::new(),
            range: None,
        }
    }

    /// Column list in the data API's select syntax; embedded relations are
    /// written as `relation(col, ...)`.
    pub fn columns(mut self, columns: impl Into<String>) -> Self {
        self.columns = columns.into();
        self
    }

    pub fn order(mut self, column: impl Into<String>, ascending: bool) -> Self {
        self.orders.push(Order {
            column: column.into(),
            ascending,
        });
        self
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push(Filter::Eq {
            column: column.into(),
            value: value.into(),
        });
        self
    }

    /// Restrict to rows `from..=to` (zero-based, inclusive end).
    pub fn range(mut self, from: u64, to: u64) -> Self {
        self.range = Some((from, to));
        self
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    pub fn selected_columns(&self) -> &str {
        &self.columns
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// Inclusive row range, if any.
    pub fn row_range(&self) -> Option<(u64, u64)> {
        self.range
    }

    /// The row range as `(offset, limit)`. An inverted range selects nothing.
    pub fn offset_limit(&self) -> Option<(u64, u64)> {
        self.range.map(|(from, to)| {
            let limit = if to < from {
                0
            } else {
                (to - from).saturating_add(1)
            };
            (from, limit)
        })
    }

    /// Query-string pairs in the data API's dialect.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("select".to_string(), compact_columns(&self.columns))];

        if !self.orders.is_empty() {
            let order = self
                .orders
                .iter()
                .map(|o| {
                    format!(
                        "{}.{}",
                        o.column,
                        if o.ascending { "asc" } else { "desc" }
                    )
                })
                .collect::<Vec<_>>()
                .join(",");
            pairs.push(("order".to_string(), order));
        }

        for filter in &self.filters {
            match filter {
                Filter::Eq { column, value } => {
                    pairs.push((column.clone(), format!("eq.{}", value)));
                }
            }
        }

        if let Some((offset, limit)) = self.offset_limit() {
            pairs.push(("offset".to_string(), offset.to_string()));
            pairs.push(("limit".to_string(), limit.to_string()));
        }

        pairs
    }
}

/// Strip whitespace outside quoted identifiers, as the data API expects.
fn compact_columns(columns: &str) -> String {
    let mut quoted = false;
    columns
        .chars()
        .filter(|c| {
            if *c == '"' {
                quoted = !quoted;
            }
            quoted || !c.is_whitespace()
        })
        .collect()
}
