/*
 * The in-memory catalog: an ordered list of category rows plus a derived
 * index from normalized category name to row position. Every mutator is
 * all-or-nothing: it validates everything it needs before touching `rows`,
 * so a returned error means the store is exactly as it was.
 *
 * Names compare trimmed and case-insensitively. The index points each
 * normalized name at its first row; rows loaded from a damaged import can
 * share a name, and `delete_category` removes all of them.
 */
use super::models::CategoryRow;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    EmptyName,
    EmptyItem,
    DuplicateName(String),
    CategoryNotFound(String),
    ItemNotFound { category: String, item: String },
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::EmptyName => write!(f, "Category name is empty"),
            StoreError::EmptyItem => write!(f, "Item value is empty"),
            StoreError::DuplicateName(name) => write!(f, "Category already exists: {name}"),
            StoreError::CategoryNotFound(name) => write!(f, "Category not found: {name}"),
            StoreError::ItemNotFound { category, item } => {
                write!(f, "Item not found in {category}: \"{item}\"")
            }
        }
    }
}

impl std::error::Error for StoreError {}

impl StoreError {
    // True for the "no such category/item" family, regardless of which part was missing.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::CategoryNotFound(_) | StoreError::ItemNotFound { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

pub fn normalize(text: &str) -> &str {
    text.trim()
}

pub fn name_key(name: &str) -> String {
    normalize(name).to_lowercase()
}

#[derive(Debug, Default, Clone)]
pub struct CategoryStore {
    rows: Vec<CategoryRow>,
    index: HashMap<String, usize>,
}

impl CategoryStore {
    pub fn new() -> Self {
        CategoryStore::default()
    }

    /*
     * Builds a store from rows that have already passed shape validation.
     * Rows with no elements cannot be represented and are dropped with a
     * warning rather than breaking the "every row has a name" invariant.
     */
    pub fn from_rows(rows: Vec<CategoryRow>) -> Self {
        let mut store = CategoryStore::new();
        store.replace_all(rows);
        store
    }

    pub fn rows(&self) -> &[CategoryRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn category_names(&self) -> Vec<String> {
        self.rows.iter().map(|row| row[0].clone()).collect()
    }

    pub fn lookup(&self, name: &str) -> Result<usize> {
        self.index
            .get(&name_key(name))
            .copied()
            .ok_or_else(|| StoreError::CategoryNotFound(normalize(name).to_string()))
    }

    pub fn items(&self, name: &str) -> Result<&[String]> {
        let idx = self.lookup(name)?;
        Ok(&self.rows[idx][1..])
    }

    pub fn insert_category(&mut self, name: &str) -> Result<usize> {
        let name = normalize(name);
        if name.is_empty() {
            return Err(StoreError::EmptyName);
        }
        let key = name_key(name);
        if self.index.contains_key(&key) {
            log::debug!("CategoryStore: Rejecting duplicate category '{name}'.");
            return Err(StoreError::DuplicateName(name.to_string()));
        }
        let position = self.rows.len();
        self.rows.push(vec![name.to_string()]);
        self.index.insert(key, position);
        log::trace!("CategoryStore: Inserted category '{name}' at {position}.");
        Ok(position)
    }

    /// Removes every row carrying `name` and returns how many were removed.
    pub fn delete_category(&mut self, name: &str) -> Result<usize> {
        let key = name_key(name);
        if !self.index.contains_key(&key) {
            return Err(StoreError::CategoryNotFound(normalize(name).to_string()));
        }
        let before = self.rows.len();
        self.rows.retain(|row| name_key(&row[0]) != key);
        let removed = before - self.rows.len();
        self.rebuild_index();
        log::trace!("CategoryStore: Deleted {removed} row(s) named '{}'.", normalize(name));
        Ok(removed)
    }

    pub fn add_item(&mut self, category: &str, item: &str) -> Result<()> {
        let idx = self.lookup(category)?;
        let item = normalize(item);
        if item.is_empty() {
            return Err(StoreError::EmptyItem);
        }
        self.rows[idx].push(item.to_string());
        Ok(())
    }

    // First case-insensitive match only; later duplicates stay.
    pub fn remove_item(&mut self, category: &str, item: &str) -> Result<String> {
        let idx = self.lookup(category)?;
        let target = name_key(item);
        if target.is_empty() {
            return Err(StoreError::EmptyItem);
        }
        let row = &mut self.rows[idx];
        let position = row
            .iter()
            .skip(1)
            .position(|existing| name_key(existing) == target)
            .map(|p| p + 1)
            .ok_or_else(|| StoreError::ItemNotFound {
                category: row[0].clone(),
                item: normalize(item).to_string(),
            })?;
        Ok(row.remove(position))
    }

    pub fn edit_item(&mut self, category: &str, old_item: &str, new_item: &str) -> Result<()> {
        let idx = self.lookup(category)?;
        let old_item = normalize(old_item);
        let new_item = normalize(new_item);
        if old_item.is_empty() || new_item.is_empty() {
            return Err(StoreError::EmptyItem);
        }
        let row = &mut self.rows[idx];
        match row.iter().skip(1).position(|existing| existing == old_item) {
            Some(p) => {
                row[p + 1] = new_item.to_string();
                Ok(())
            }
            None => Err(StoreError::ItemNotFound {
                category: row[0].clone(),
                item: old_item.to_string(),
            }),
        }
    }

    pub fn clear_items(&mut self, category: &str) -> Result<usize> {
        let idx = self.lookup(category)?;
        let row = &mut self.rows[idx];
        let cleared = row.len() - 1;
        row.truncate(1);
        Ok(cleared)
    }

    /*
     * Swaps the whole row set in one step and re-derives the index. Used by
     * import and "new database"; callers validate before calling.
     */
    pub fn replace_all(&mut self, rows: Vec<CategoryRow>) {
        let before = rows.len();
        self.rows = rows.into_iter().filter(|row| !row.is_empty()).collect();
        if self.rows.len() != before {
            log::warn!(
                "CategoryStore: Dropped {} row(s) without a category name.",
                before - self.rows.len()
            );
        }
        self.rebuild_index();
    }

    fn rebuild_index(&mut self) {
        self.index.clear();
        for (position, row) in self.rows.iter().enumerate() {
            self.index.entry(name_key(&row[0])).or_insert(position);
        }
    }

    /// Plain-text report of every category: `[name]`, its items, and a separator line.
    pub fn full_report(&self) -> String {
        let mut out = String::new();
        for row in &self.rows {
            out.push_str(&format!("[{}]\n", row[0]));
            out.push_str(&row[1..].join("\n"));
            out.push('\n');
            out.push_str("=============\n");
        }
        out.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(values: &[&str]) -> CategoryRow {
        values.iter().map(|v| v.to_string()).collect()
    }

    // Checks that every row's key resolves to the first row with that key.
    fn assert_index_consistent(store: &CategoryStore) {
        assert!(store.index.values().all(|&p| p < store.rows.len()));
        for (position, r) in store.rows.iter().enumerate() {
            let first = store
                .rows
                .iter()
                .position(|other| name_key(&other[0]) == name_key(&r[0]))
                .unwrap();
            assert_eq!(store.index.get(&name_key(&r[0])), Some(&first));
            assert!(first <= position);
        }
        let distinct: std::collections::HashSet<String> =
            store.rows.iter().map(|r| name_key(&r[0])).collect();
        assert_eq!(store.index.len(), distinct.len());
    }

    #[test]
    fn test_insert_then_lookup_returns_position() {
        let mut store = CategoryStore::new();
        store.insert_category("Tools").unwrap();
        let pos = store.insert_category("Books").unwrap();

        assert_eq!(store.lookup("Books"), Ok(pos));
        assert_eq!(store.lookup("  books "), Ok(1));
        assert_index_consistent(&store);
    }

    #[test]
    fn test_insert_rejects_case_and_whitespace_variants() {
        let mut store = CategoryStore::new();
        store.insert_category("Tools").unwrap();

        assert_eq!(
            store.insert_category("tools"),
            Err(StoreError::DuplicateName("tools".to_string()))
        );
        assert!(matches!(
            store.insert_category("  TOOLS  "),
            Err(StoreError::DuplicateName(_))
        ));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_insert_trims_and_rejects_blank() {
        let mut store = CategoryStore::new();
        assert_eq!(store.insert_category("   "), Err(StoreError::EmptyName));
        store.insert_category("  Spaced  ").unwrap();
        assert_eq!(store.rows()[0], row(&["Spaced"]));
    }

    #[test]
    fn test_lookup_missing_is_not_found() {
        let store = CategoryStore::new();
        assert!(store.lookup("nothing").unwrap_err().is_not_found());
    }

    #[test]
    fn test_delete_category_removes_all_duplicates() {
        let mut store = CategoryStore::from_rows(vec![
            row(&["A", "1"]),
            row(&["Dup", "x"]),
            row(&["B"]),
            row(&["dup ", "y"]),
            row(&["C"]),
        ]);
        assert_index_consistent(&store);

        let removed = store.delete_category("DUP").unwrap();

        assert_eq!(removed, 2);
        assert_eq!(store.len(), 3);
        assert_eq!(store.category_names(), vec!["A", "B", "C"]);
        assert_eq!(store.lookup("C"), Ok(2));
        assert_index_consistent(&store);
    }

    #[test]
    fn test_delete_missing_category_leaves_store_untouched() {
        let mut store = CategoryStore::from_rows(vec![row(&["A", "1"])]);
        assert!(store.delete_category("B").is_err());
        assert_eq!(store.rows(), &[row(&["A", "1"])]);
    }

    #[test]
    fn test_add_then_remove_item_round_trip() {
        let mut store = CategoryStore::from_rows(vec![row(&["X", "keep"])]);
        let before = store.rows().to_vec();

        store.add_item("X", "a").unwrap();
        assert_eq!(store.items("X").unwrap(), &["keep", "a"]);
        store.remove_item("X", "a").unwrap();

        assert_eq!(store.rows(), before.as_slice());
    }

    #[test]
    fn test_add_item_trims_and_allows_duplicates() {
        let mut store = CategoryStore::from_rows(vec![row(&["X"])]);
        store.add_item("x", "  a ").unwrap();
        store.add_item("X", "a").unwrap();
        assert_eq!(store.items("X").unwrap(), &["a", "a"]);
        assert_eq!(store.add_item("X", "  "), Err(StoreError::EmptyItem));
        assert!(store.add_item("Y", "a").unwrap_err().is_not_found());
    }

    #[test]
    fn test_remove_item_takes_first_case_insensitive_match() {
        let mut store = CategoryStore::from_rows(vec![row(&["X", "b", "Apple", "apple"])]);

        let removed = store.remove_item("X", " APPLE ").unwrap();

        assert_eq!(removed, "Apple");
        assert_eq!(store.items("X").unwrap(), &["b", "apple"]);
    }

    #[test]
    fn test_remove_item_never_matches_the_name() {
        let mut store = CategoryStore::from_rows(vec![row(&["X"])]);
        assert!(matches!(
            store.remove_item("X", "X"),
            Err(StoreError::ItemNotFound { .. })
        ));
        assert_eq!(store.rows(), &[row(&["X"])]);
    }

    #[test]
    fn test_edit_item_requires_exact_match() {
        let mut store = CategoryStore::from_rows(vec![row(&["X", "Apple", "pear", "pear"])]);

        assert!(matches!(
            store.edit_item("X", "apple", "Kiwi"),
            Err(StoreError::ItemNotFound { .. })
        ));
        store.edit_item("X", "pear", " Plum ").unwrap();

        assert_eq!(store.items("X").unwrap(), &["Apple", "Plum", "pear"]);
    }

    #[test]
    fn test_edit_item_same_value_is_noop() {
        let mut store = CategoryStore::from_rows(vec![row(&["X", "a", "b"])]);
        let before = store.rows().to_vec();
        store.edit_item("X", "a", "a").unwrap();
        assert_eq!(store.rows(), before.as_slice());
    }

    #[test]
    fn test_clear_items_keeps_name() {
        let mut store = CategoryStore::from_rows(vec![row(&["X", "a", "b"]), row(&["Y", "c"])]);
        assert_eq!(store.clear_items("x"), Ok(2));
        assert_eq!(store.rows(), &[row(&["X"]), row(&["Y", "c"])]);
        assert!(store.clear_items("Z").is_err());
    }

    #[test]
    fn test_replace_all_rebuilds_index() {
        let mut store = CategoryStore::from_rows(vec![row(&["Old"])]);
        store.replace_all(vec![row(&["New", "1"]), vec![], row(&["Other"])]);

        assert_eq!(store.len(), 2);
        assert!(store.lookup("Old").is_err());
        assert_eq!(store.lookup("other"), Ok(1));
        assert_index_consistent(&store);
    }

    #[test]
    fn test_full_report_layout() {
        let store = CategoryStore::from_rows(vec![row(&["A", "1", "2"]), row(&["B"])]);
        assert_eq!(
            store.full_report(),
            "[A]\n1\n2\n=============\n[B]\n\n============="
        );
        assert_eq!(CategoryStore::new().full_report(), "");
    }
}
