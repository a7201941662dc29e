use crate::core::{Column, Filter, Result, Row, Schema, StoreError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Stored cells, aligned with the schema's column order. `None` is a column
/// the row never set.
type Cells = Vec<Option<String>>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    schema: TableSchema,
    rows: BTreeMap<usize, Cells>,
    next_row_id: usize,
}

impl Table {
    pub fn new(schema: TableSchema) -> Self {
        Self {
            schema,
            rows: BTreeMap::new(),
            next_row_id: 0,
        }
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn insert(&mut self, row: &Row) -> Result<usize> {
        let mut cells: Cells = vec![None; self.schema.schema().column_count()];
        for (name, value) in row {
            let idx = self.column_index(name)?;
            cells[idx] = Some(value.clone());
        }

        let id = self.next_row_id;
        self.next_row_id += 1;
        self.rows.insert(id, cells);
        Ok(id)
    }

    /// Inserts every row or none: all columns are checked before the first
    /// insert.
    pub fn insert_all(&mut self, rows: &[Row]) -> Result<Undo> {
        for row in rows {
            for name in row.keys() {
                self.column_index(name)?;
            }
        }

        let mut undo = Undo::default();
        for row in rows {
            undo.inserted.push(self.insert(row)?);
        }
        Ok(undo)
    }

    pub fn count_where(&self, filter: &Filter) -> Result<usize> {
        let idx = self.column_index(&filter.column)?;
        Ok(self
            .rows
            .values()
            .filter(|cells| Self::matches(cells, idx, &filter.value))
            .count())
    }

    /// Applies `assignments` to every row matching `filter`. The returned
    /// [`Undo`] counts the rows touched.
    pub fn update_where(&mut self, filter: &Filter, assignments: &Row) -> Result<Undo> {
        let filter_idx = self.column_index(&filter.column)?;
        let targets = assignments
            .iter()
            .map(|(name, value)| Ok((self.column_index(name)?, value)))
            .collect::<Result<Vec<_>>>()?;

        let mut undo = Undo::default();
        for (id, cells) in self.rows.iter_mut() {
            if !Self::matches(cells, filter_idx, &filter.value) {
                continue;
            }
            undo.replaced.push((*id, cells.clone()));
            for (idx, value) in &targets {
                cells[*idx] = Some((*value).clone());
            }
        }
        Ok(undo)
    }

    pub fn scan(&self, filter: Option<&Filter>) -> Result<Vec<Row>> {
        let filter_idx = filter.map(|f| self.column_index(&f.column)).transpose()?;
        let columns = self.schema.schema().columns();

        let rows = self
            .rows
            .values()
            .filter(|cells| match (filter, filter_idx) {
                (Some(f), Some(idx)) => Self::matches(cells, idx, &f.value),
                _ => true,
            })
            .map(|cells| {
                columns
                    .iter()
                    .zip(cells)
                    .filter_map(|(col, cell)| cell.as_ref().map(|v| (col.name.clone(), v.clone())))
                    .collect::<Row>()
            })
            .collect();
        Ok(rows)
    }

    /// Appends new text columns; existing rows read them as unset.
    pub fn add_columns(&mut self, columns: Vec<Column>) -> Undo {
        let undo = Undo {
            column_count: Some(self.schema.schema().column_count()),
            ..Undo::default()
        };
        for column in columns {
            if self.schema.schema().contains(&column.name) {
                continue;
            }
            self.schema.schema_mut().push(column);
            for cells in self.rows.values_mut() {
                cells.push(None);
            }
        }
        undo
    }

    /// Reverts the mutation that produced `undo`.
    pub fn rollback(&mut self, undo: Undo) {
        for id in undo.inserted {
            self.rows.remove(&id);
        }
        for (id, cells) in undo.replaced {
            self.rows.insert(id, cells);
        }
        if let Some(count) = undo.column_count {
            self.schema.schema_mut().truncate(count);
            for cells in self.rows.values_mut() {
                cells.truncate(count);
            }
        }
    }

    fn column_index(&self, name: &str) -> Result<usize> {
        self.schema
            .schema()
            .find_column_index(name)
            .ok_or_else(|| StoreError::ColumnNotFound(name.to_string(), self.schema.name.clone()))
    }

    fn matches(cells: &Cells, idx: usize, value: &str) -> bool {
        cells[idx].as_deref() == Some(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    name: String,
    schema: Schema,
}

impl TableSchema {
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            name: name.into(),
            schema: Schema::new(columns),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.schema.columns().iter().map(|c| c.name.as_str()).collect()
    }

    fn schema_mut(&mut self) -> &mut Schema {
        &mut self.schema
    }
}

/// What one table mutation changed, kept until the change is durable.
#[derive(Debug, Default)]
pub struct Undo {
    inserted: Vec<usize>,
    replaced: Vec<(usize, Cells)>,
    column_count: Option<usize>,
}

impl Undo {
    /// Rows inserted or updated.
    pub fn affected(&self) -> usize {
        self.inserted.len() + self.replaced.len()
    }
}
