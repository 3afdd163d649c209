//! Statement execution against the catalog.

use super::evaluator::{
    bind, bind_predicate, compare_values, supertype, BoundExpr, Scope, ScopeColumn,
};
use crate::catalog::{Catalog, Table};
use crate::cast::{self, cast_value};
use crate::config::{Config, NullOrder, SortOrder};
use crate::error::{CoreError, CoreResult};
use crate::result::ResultSet;
use crate::sql::ast::{Expr, Insert, Literal, OrderByExpr, Query, Select, SelectItem, Statement};
use crate::types::{DataType, LogicalType};
use crate::value::Value;
use crate::vector::{Column, ColumnBuilder};
use std::cmp::Ordering;
use std::collections::HashSet;

/// Rows produced by a query, before materialization.
#[derive(Debug)]
struct Relation {
    names: Vec<String>,
    types: Vec<DataType>,
    rows: Vec<Vec<Value>>,
}

impl Relation {
    fn into_result(self) -> CoreResult<ResultSet> {
        let mut builders: Vec<ColumnBuilder> = self
            .types
            .into_iter()
            .map(|ty| ColumnBuilder::with_capacity(ty, self.rows.len()))
            .collect();
        for row in &self.rows {
            for (builder, value) in builders.iter_mut().zip(row) {
                builder.append(value)?;
            }
        }
        ResultSet::new(
            self.names,
            builders.into_iter().map(ColumnBuilder::finish).collect(),
        )
    }
}

fn statement_name(statement: &Statement) -> &'static str {
    match statement {
        Statement::Query(_) => "SELECT",
        Statement::CreateTable(_) => "CREATE",
        Statement::Insert(_) => "INSERT",
        Statement::DropTable { .. } => "DROP",
        Statement::Delete { .. } => "DELETE",
        Statement::Update { .. } => "UPDATE",
    }
}

/// Executes one statement.
///
/// Queries return their rows; `INSERT`, `UPDATE` and `DELETE` return a
/// single BIGINT `Count` column; DDL returns an empty result.
pub fn execute(
    catalog: &mut Catalog,
    config: &Config,
    statement: &Statement,
) -> CoreResult<ResultSet> {
    if statement.is_mutation() && config.is_read_only() {
        return Err(CoreError::query(format!(
            "Invalid Input Error: Cannot execute statement of type \"{}\" in read-only mode!",
            statement_name(statement)
        )));
    }
    match statement {
        Statement::Query(query) => {
            let relation = run_query(catalog, config, query)?;
            if let Some(max) = config.max_result_rows {
                if relation.rows.len() > max {
                    return Err(CoreError::query(format!(
                        "Invalid Input Error: query produced {} rows, more than max_result_rows ({max})",
                        relation.rows.len()
                    )));
                }
            }
            relation.into_result()
        }
        Statement::CreateTable(create) => {
            catalog.create_table(&create.name, &create.columns, create.if_not_exists)?;
            Ok(ResultSet::empty())
        }
        Statement::DropTable { name, if_exists } => {
            catalog.drop_table(name, *if_exists)?;
            Ok(ResultSet::empty())
        }
        Statement::Insert(insert) => execute_insert(catalog, config, insert),
        Statement::Delete { table, selection } => {
            execute_delete(catalog.table_mut(table)?, selection.as_ref())
        }
        Statement::Update {
            table,
            assignments,
            selection,
        } => execute_update(catalog.table_mut(table)?, assignments, selection.as_ref()),
    }
}

fn count_result(count: usize) -> CoreResult<ResultSet> {
    let count = i64::try_from(count).unwrap_or(i64::MAX);
    let column = Column::from_values(DataType::BigInt, &[Value::BigInt(count)])?;
    ResultSet::new(vec!["Count".to_string()], vec![column])
}

fn table_scope(table: &Table, qualifier: &str) -> Scope {
    Scope::new(
        table
            .columns()
            .iter()
            .map(|c| ScopeColumn {
                qualifier: Some(qualifier.to_string()),
                name: c.name.clone(),
                data_type: c.data_type.clone(),
            })
            .collect(),
    )
}

fn run_query(catalog: &Catalog, config: &Config, query: &Query) -> CoreResult<Relation> {
    match query {
        Query::Select(select) => run_select(catalog, config, select),
        Query::Values(rows) => run_values(rows),
    }
}

fn run_values(rows: &[Vec<Expr>]) -> CoreResult<Relation> {
    let scope = Scope::empty();
    let bound = rows
        .iter()
        .map(|row| row.iter().map(|e| bind(e, &scope)).collect::<CoreResult<Vec<_>>>())
        .collect::<CoreResult<Vec<_>>>()?;
    let width = bound.first().map_or(0, Vec::len);
    let types = (0..width)
        .map(|i| supertype(bound.iter().map(|row| row[i].data_type())))
        .collect::<CoreResult<Vec<_>>>()?;

    let mut out = Vec::with_capacity(bound.len());
    for row in &bound {
        let values = row
            .iter()
            .zip(&types)
            .map(|(expr, ty)| cast_value(&expr.eval(&[])?, ty))
            .collect::<CoreResult<Vec<_>>>()?;
        out.push(values);
    }
    Ok(Relation {
        names: (0..width).map(|i| format!("col{i}")).collect(),
        types,
        rows: out,
    })
}

/// Where an `ORDER BY` key comes from.
enum SortKey {
    /// A projected column, by position.
    Output(usize),
    /// An expression over the input row.
    Input(BoundExpr),
}

struct SortSpec {
    key: SortKey,
    descending: bool,
    nulls_first: bool,
}

fn output_name(expr: &Expr, alias: Option<&String>) -> String {
    match (alias, expr) {
        (Some(alias), _) => alias.clone(),
        (None, Expr::Column { name, .. }) => name.clone(),
        (None, other) => other.to_string(),
    }
}

fn sort_spec(
    term: &OrderByExpr,
    names: &[String],
    scope: &Scope,
    config: &Config,
) -> CoreResult<SortSpec> {
    let key = match &term.expr {
        Expr::Literal(Literal::Number(text)) if text.parse::<usize>().is_ok() => {
            let position = text.parse::<usize>().unwrap_or_default();
            if position == 0 || position > names.len() {
                return Err(CoreError::query(format!(
                    "Binder Error: ORDER term out of range - should be between 1 and {}",
                    names.len()
                )));
            }
            SortKey::Output(position - 1)
        }
        Expr::Column { table: None, name } => {
            match names.iter().position(|n| n.eq_ignore_ascii_case(name)) {
                Some(index) => SortKey::Output(index),
                None => SortKey::Input(bind(&term.expr, scope)?),
            }
        }
        other => SortKey::Input(bind(other, scope)?),
    };
    let descending = match term.asc {
        Some(asc) => !asc,
        None => config.default_order == SortOrder::Desc,
    };
    let nulls_first = term
        .nulls_first
        .unwrap_or(config.default_null_order == NullOrder::NullsFirst);
    Ok(SortSpec {
        key,
        descending,
        nulls_first,
    })
}

fn compare_keys(a: &[Value], b: &[Value], specs: &[SortSpec]) -> Ordering {
    for ((x, y), spec) in a.iter().zip(b).zip(specs) {
        let ord = match (x.is_null(), y.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) if spec.nulls_first => Ordering::Less,
            (true, false) => Ordering::Greater,
            (false, true) if spec.nulls_first => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) if spec.descending => compare_values(y, x),
            (false, false) => compare_values(x, y),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

/// Evaluates a `LIMIT`/`OFFSET` operand. `NULL` means no bound.
fn row_bound(expr: Option<&Expr>, clause: &str) -> CoreResult<Option<usize>> {
    let Some(expr) = expr else {
        return Ok(None);
    };
    let value = bind(expr, &Scope::empty())?.eval(&[])?;
    if value.is_null() {
        return Ok(None);
    }
    let n: i64 = cast::to_integer(&value, LogicalType::BigInt)?;
    usize::try_from(n).map(Some).map_err(|_| {
        CoreError::query(format!(
            "Invalid Input Error: {clause} must not be negative, got {n}"
        ))
    })
}

fn run_select(catalog: &Catalog, config: &Config, select: &Select) -> CoreResult<Relation> {
    let implicit_row = [Vec::new()];
    let (scope, source): (Scope, &[Vec<Value>]) = match &select.from {
        Some(from) => {
            let table = catalog.table(&from.name)?;
            let qualifier = from.alias.as_deref().unwrap_or(table.name());
            (table_scope(table, qualifier), table.rows())
        }
        None => (Scope::empty(), &implicit_row),
    };

    let mut names = Vec::new();
    let mut exprs = Vec::new();
    for item in &select.projection {
        match item {
            SelectItem::Wildcard => {
                if select.from.is_none() {
                    return Err(CoreError::query(
                        "Binder Error: SELECT * expression without FROM clause!",
                    ));
                }
                for (i, column) in scope.columns().iter().enumerate() {
                    names.push(column.name.clone());
                    exprs.push(BoundExpr::column(i, column.data_type.clone()));
                }
            }
            SelectItem::QualifiedWildcard(qualifier) => {
                let before = exprs.len();
                for (i, column) in scope.columns().iter().enumerate() {
                    let matches = column
                        .qualifier
                        .as_deref()
                        .is_some_and(|q| q.eq_ignore_ascii_case(qualifier));
                    if matches {
                        names.push(column.name.clone());
                        exprs.push(BoundExpr::column(i, column.data_type.clone()));
                    }
                }
                if exprs.len() == before {
                    return Err(CoreError::query(format!(
                        "Binder Error: Referenced table \"{qualifier}\" not found!"
                    )));
                }
            }
            SelectItem::Expr { expr, alias } => {
                names.push(output_name(expr, alias.as_ref()));
                exprs.push(bind(expr, &scope)?);
            }
        }
    }

    let predicate = select
        .selection
        .as_ref()
        .map(|e| bind_predicate(e, &scope))
        .transpose()?;
    let specs = select
        .order_by
        .iter()
        .map(|term| sort_spec(term, &names, &scope, config))
        .collect::<CoreResult<Vec<_>>>()?;

    let mut produced: Vec<(Vec<Value>, Vec<Value>)> = Vec::new();
    for row in source {
        if let Some(predicate) = &predicate {
            if !predicate.is_true(row)? {
                continue;
            }
        }
        let out = exprs
            .iter()
            .map(|e| e.eval(row))
            .collect::<CoreResult<Vec<_>>>()?;
        let keys = specs
            .iter()
            .map(|spec| match &spec.key {
                SortKey::Output(i) => Ok(out[*i].clone()),
                SortKey::Input(e) => e.eval(row),
            })
            .collect::<CoreResult<Vec<_>>>()?;
        produced.push((out, keys));
    }

    if !specs.is_empty() {
        produced.sort_by(|a, b| compare_keys(&a.1, &b.1, &specs));
    }
    let mut rows: Vec<Vec<Value>> = produced.into_iter().map(|(out, _)| out).collect();

    if select.distinct {
        let mut seen = HashSet::new();
        rows.retain(|row| seen.insert(format!("{row:?}")));
    }

    let offset = row_bound(select.offset.as_ref(), "OFFSET")?.unwrap_or(0);
    let limit = row_bound(select.limit.as_ref(), "LIMIT")?;
    let rows: Vec<Vec<Value>> = rows
        .into_iter()
        .skip(offset)
        .take(limit.unwrap_or(usize::MAX))
        .collect();

    Ok(Relation {
        names,
        types: exprs.iter().map(|e| e.data_type().clone()).collect(),
        rows,
    })
}

fn execute_insert(
    catalog: &mut Catalog,
    config: &Config,
    insert: &Insert,
) -> CoreResult<ResultSet> {
    let relation = run_query(catalog, config, &insert.source)?;
    let table = catalog.table_mut(&insert.table)?;

    let targets: Vec<usize> = if insert.columns.is_empty() {
        (0..table.columns().len()).collect()
    } else {
        let mut targets = Vec::with_capacity(insert.columns.len());
        for name in &insert.columns {
            let index = table.column_index(name).ok_or_else(|| {
                CoreError::query(format!(
                    "Binder Error: Table \"{}\" does not have a column with name \"{name}\"",
                    table.name()
                ))
            })?;
            if targets.contains(&index) {
                return Err(CoreError::query(format!(
                    "Binder Error: Duplicate column name \"{name}\" in INSERT"
                )));
            }
            targets.push(index);
        }
        targets
    };
    if relation.types.len() != targets.len() {
        return Err(CoreError::query(format!(
            "Binder Error: table {} has {} columns but {} values were supplied",
            table.name(),
            targets.len(),
            relation.types.len()
        )));
    }

    let width = table.columns().len();
    let mut rows = Vec::with_capacity(relation.rows.len());
    for source_row in relation.rows {
        let mut row = vec![Value::Null; width];
        for (value, &index) in source_row.iter().zip(&targets) {
            row[index] = cast_value(value, &table.columns()[index].data_type)?;
        }
        rows.push(row);
    }
    count_result(table.insert_rows(rows)?)
}

fn execute_delete(table: &mut Table, selection: Option<&Expr>) -> CoreResult<ResultSet> {
    let scope = table_scope(table, table.name());
    let predicate = selection.map(|e| bind_predicate(e, &scope)).transpose()?;

    let mut kept = Vec::with_capacity(table.row_count());
    let mut deleted = 0;
    for row in table.rows() {
        let hit = match &predicate {
            Some(predicate) => predicate.is_true(row)?,
            None => true,
        };
        if hit {
            deleted += 1;
        } else {
            kept.push(row.clone());
        }
    }
    table.replace_rows(kept)?;
    count_result(deleted)
}

fn execute_update(
    table: &mut Table,
    assignments: &[(String, Expr)],
    selection: Option<&Expr>,
) -> CoreResult<ResultSet> {
    let scope = table_scope(table, table.name());
    let predicate = selection.map(|e| bind_predicate(e, &scope)).transpose()?;
    let mut bound = Vec::with_capacity(assignments.len());
    for (name, expr) in assignments {
        let index = table.column_index(name).ok_or_else(|| {
            CoreError::query(format!(
                "Binder Error: Referenced update column {name} not found in table!"
            ))
        })?;
        let target = &table.columns()[index].data_type;
        bound.push((index, bind(expr, &scope)?.cast_to(target)));
    }

    let mut updated = 0;
    let mut rows = Vec::with_capacity(table.row_count());
    for row in table.rows() {
        let hit = match &predicate {
            Some(predicate) => predicate.is_true(row)?,
            None => true,
        };
        if !hit {
            rows.push(row.clone());
            continue;
        }
        let mut new_row = row.clone();
        for (index, expr) in &bound {
            new_row[*index] = expr.eval(row)?;
        }
        rows.push(new_row);
        updated += 1;
    }
    table.replace_rows(rows)?;
    count_result(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AccessMode;
    use crate::error::ErrorKind;
    use crate::sql;

    struct Session {
        catalog: Catalog,
        config: Config,
    }

    impl Session {
        fn new() -> Self {
            Self::with_config(Config::default())
        }

        fn with_config(config: Config) -> Self {
            Self {
                catalog: Catalog::new(),
                config,
            }
        }

        fn run(&mut self, sql: &str) -> CoreResult<ResultSet> {
            let mut last = ResultSet::empty();
            for statement in sql::parse(sql)? {
                last = execute(&mut self.catalog, &self.config, &statement)?;
            }
            Ok(last)
        }

        fn rows(&mut self, sql: &str) -> Vec<Vec<String>> {
            self.run(sql)
                .unwrap()
                .rows()
                .map(|row| row.iter().map(ToString::to_string).collect())
                .collect()
        }

        fn seeded() -> Self {
            let mut session = Self::new();
            session
                .run(
                    "CREATE TABLE people (id INTEGER NOT NULL, name VARCHAR, score DOUBLE);
                     INSERT INTO people VALUES (1, 'ann', 3.5), (2, 'bob', NULL), (3, 'cy', 1.0);",
                )
                .unwrap();
            session
        }
    }

    #[test]
    fn literal_row_reads_back_exactly() {
        let mut s = Session::new();
        let result = s.run("SELECT 1, 'a', NULL").unwrap();
        assert_eq!(result.column_count(), 3);
        assert_eq!(result.row_count(), 1);
        assert_eq!(result.value_i32(0, 0).unwrap(), Some(1));
        assert_eq!(result.value_string(1, 0).unwrap().as_deref(), Some("a"));
        assert!(result.is_null(2, 0).unwrap());
        assert_eq!(result.value_string(2, 0).unwrap(), None);
        assert!(!result.is_null(0, 0).unwrap());
    }

    #[test]
    fn select_without_from() {
        let mut s = Session::new();
        let result = s.run("SELECT 1, 'a' AS letter, NULL, 1 + 2").unwrap();
        assert_eq!(result.row_count(), 1);
        assert_eq!(result.column_name(0).unwrap(), "1");
        assert_eq!(result.column_name(1).unwrap(), "letter");
        assert_eq!(result.column_name(2).unwrap(), "NULL");
        assert_eq!(result.column_name(3).unwrap(), "(1 + 2)");
        assert_eq!(result.column_type(0).unwrap(), LogicalType::Integer);
        assert_eq!(result.column_type(2).unwrap(), LogicalType::SqlNull);
        assert_eq!(result.value_i32(3, 0).unwrap(), Some(3));
        assert!(s.run("SELECT *").is_err());
    }

    #[test]
    fn scan_filter_and_project() {
        let mut s = Session::seeded();
        assert_eq!(
            s.rows("SELECT name FROM people WHERE score > 2 OR score IS NULL"),
            vec![vec!["ann"], vec!["bob"]]
        );
        let result = s.run("SELECT p.* FROM people AS p").unwrap();
        assert_eq!(result.column_count(), 3);
        assert_eq!(result.row_count(), 3);
        assert_eq!(result.column_type(2).unwrap(), LogicalType::Double);
    }

    #[test]
    fn order_by_limit_offset() {
        let mut s = Session::seeded();
        assert_eq!(
            s.rows("SELECT id FROM people ORDER BY score"),
            vec![vec!["3"], vec!["1"], vec!["2"]]
        );
        assert_eq!(
            s.rows("SELECT id FROM people ORDER BY score DESC NULLS FIRST"),
            vec![vec!["2"], vec!["1"], vec!["3"]]
        );
        assert_eq!(
            s.rows("SELECT id AS k FROM people ORDER BY k DESC LIMIT 2"),
            vec![vec!["3"], vec!["2"]]
        );
        assert_eq!(
            s.rows("SELECT name FROM people ORDER BY 1 LIMIT 1 OFFSET 1"),
            vec![vec!["bob"]]
        );
        assert!(s.run("SELECT id FROM people ORDER BY 2").is_err());
        assert!(s.run("SELECT id FROM people LIMIT -1").is_err());
    }

    #[test]
    fn default_sort_order_from_config() {
        let config = Config::new()
            .default_order(SortOrder::Desc)
            .default_null_order(NullOrder::NullsFirst);
        let mut s = Session::with_config(config);
        s.run("CREATE TABLE t (x INTEGER); INSERT INTO t VALUES (1), (NULL), (2)")
            .unwrap();
        assert_eq!(
            s.rows("SELECT x FROM t ORDER BY x"),
            vec![vec!["NULL"], vec!["2"], vec!["1"]]
        );
    }

    #[test]
    fn distinct_rows() {
        let mut s = Session::new();
        s.run("CREATE TABLE t (x INTEGER); INSERT INTO t VALUES (1), (1), (NULL), (NULL), (2)")
            .unwrap();
        assert_eq!(
            s.rows("SELECT DISTINCT x FROM t ORDER BY x"),
            vec![vec!["1"], vec!["2"], vec!["NULL"]]
        );
    }

    #[test]
    fn values_use_common_type() {
        let mut s = Session::new();
        let result = s.run("VALUES (1, 'a'), (2.5, NULL)").unwrap();
        assert_eq!(result.column_name(0).unwrap(), "col0");
        assert_eq!(result.column_name(1).unwrap(), "col1");
        assert_eq!(result.column_type(0).unwrap(), LogicalType::Decimal);
        assert_eq!(result.value_string(0, 0).unwrap().as_deref(), Some("1.0"));
        assert_eq!(result.value_string(1, 1).unwrap(), None);
    }

    #[test]
    fn insert_with_column_list_and_select() {
        let mut s = Session::seeded();
        let count = s
            .run("INSERT INTO people (name, id) VALUES ('dee', 4)")
            .unwrap();
        assert_eq!(count.column_name(0).unwrap(), "Count");
        assert_eq!(count.value_i64(0, 0).unwrap(), Some(1));
        assert_eq!(
            s.rows("SELECT score FROM people WHERE id = 4"),
            vec![vec!["NULL"]]
        );

        s.run("CREATE TABLE copy (id BIGINT, name VARCHAR)").unwrap();
        let count = s
            .run("INSERT INTO copy SELECT id, upper(name) FROM people WHERE id < 3")
            .unwrap();
        assert_eq!(count.value_i64(0, 0).unwrap(), Some(2));
        assert_eq!(
            s.rows("SELECT * FROM copy ORDER BY id"),
            vec![vec!["1", "ANN"], vec!["2", "BOB"]]
        );
    }

    #[test]
    fn insert_errors_keep_their_kind() {
        let mut s = Session::new();
        s.run("CREATE TABLE t (x TINYINT NOT NULL)").unwrap();
        let err = s.run("INSERT INTO t VALUES (1000)").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Overflow);
        let err = s.run("INSERT INTO t VALUES ('abc')").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
        let err = s.run("INSERT INTO t VALUES (NULL)").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Query);
        assert!(s.run("INSERT INTO t VALUES (1, 2)").is_err());
        assert!(s.run("INSERT INTO t (y) VALUES (1)").is_err());
        assert_eq!(s.run("SELECT * FROM t").unwrap().row_count(), 0);
    }

    #[test]
    fn update_and_delete() {
        let mut s = Session::seeded();
        let updated = s
            .run("UPDATE people SET score = score * 2, name = name || '!' WHERE id <> 2")
            .unwrap();
        assert_eq!(updated.value_i64(0, 0).unwrap(), Some(2));
        assert_eq!(
            s.rows("SELECT name, score FROM people ORDER BY id"),
            vec![
                vec!["ann!", "7"],
                vec!["bob", "NULL"],
                vec!["cy!", "2"]
            ]
        );

        let deleted = s.run("DELETE FROM people WHERE score IS NULL").unwrap();
        assert_eq!(deleted.value_i64(0, 0).unwrap(), Some(1));
        let deleted = s.run("DELETE FROM people").unwrap();
        assert_eq!(deleted.value_i64(0, 0).unwrap(), Some(2));
        assert_eq!(s.run("SELECT * FROM people").unwrap().row_count(), 0);
        assert!(s.run("UPDATE people SET nope = 1").is_err());
    }

    #[test]
    fn read_only_rejects_mutations() {
        let mut s = Session::with_config(Config::new().access_mode(AccessMode::ReadOnly));
        let err = s.run("CREATE TABLE t (x INTEGER)").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Query);
        assert!(err.to_string().contains("read-only"));
        assert!(s.run("SELECT 42").is_ok());
    }

    #[test]
    fn max_result_rows_is_enforced() {
        let mut s = Session::with_config(Config::new().max_result_rows(Some(2)));
        assert!(s.run("VALUES (1), (2)").is_ok());
        let err = s.run("VALUES (1), (2), (3)").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Query);
    }

    #[test]
    fn drop_and_missing_tables() {
        let mut s = Session::seeded();
        s.run("DROP TABLE people").unwrap();
        let err = s.run("SELECT * FROM people").unwrap_err();
        assert!(err.to_string().contains("does not exist"));
        s.run("DROP TABLE IF EXISTS people").unwrap();
    }
}
