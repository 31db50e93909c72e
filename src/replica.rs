//! Replica
//!
//! A replica holds the confirmed catalog (last state delivered by the store),
//! at most one staged catalog (a local mutation whose writes are still in
//! flight), and, when awaiting confirmation, the documents the store accepted
//! but has not pushed back yet. Remote snapshots always land in the confirmed
//! state; local mutations validate against confirmed state with the accepted
//! documents laid over it.

use crate::{
    catalog::{Catalog, CatalogChange, CatalogError, Category},
    parts::{Part, PartId},
};

/// How tentative state is surfaced and resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SyncMode {
    /// Tentative state is visible at once and becomes confirmed when the
    /// writes succeed. Used with stores that do not push.
    #[default]
    Optimistic,

    /// Only confirmed state is visible. Accepted writes are confirmed by the
    /// store pushing the authoritative collections back.
    AwaitConfirmation,
}

#[derive(Debug, Clone)]
struct Staged {
    catalog: Catalog,
    change: CatalogChange,
}

/// Accepted writes not yet seen in a snapshot. `None` marks a deletion.
#[derive(Debug, Clone, Default)]
struct Unconfirmed {
    parts: Vec<(PartId, Option<Part>)>,
    categories: Vec<(String, Option<Category>)>,
}

impl Unconfirmed {
    fn is_empty(&self) -> bool {
        self.parts.is_empty() && self.categories.is_empty()
    }

    fn record(&mut self, change: &CatalogChange) {
        for id in &change.removed_parts {
            upsert(&mut self.parts, *id, None);
        }

        for part in &change.upserted_parts {
            upsert(&mut self.parts, part.id, Some(part.clone()));
        }

        for name in &change.removed_categories {
            upsert(&mut self.categories, name.clone(), None);
        }

        for category in &change.upserted_categories {
            upsert(&mut self.categories, category.name.clone(), Some(category.clone()));
        }
    }

    fn settle_parts(&mut self, confirmed: &Catalog) {
        self.parts
            .retain(|(id, expected)| confirmed.part(*id) != expected.as_ref());
    }

    fn settle_categories(&mut self, confirmed: &Catalog) {
        self.categories.retain(|(name, expected)| {
            let current = confirmed
                .category_entries()
                .iter()
                .find(|category| &category.name == name);

            current != expected.as_ref()
        });
    }

    /// `confirmed` with every unconfirmed document laid over it.
    fn overlay(&self, confirmed: &Catalog) -> Catalog {
        let mut parts = confirmed.parts().to_vec();

        for (id, expected) in &self.parts {
            let index = parts.iter().position(|part| part.id == *id);

            match (index, expected) {
                (Some(index), Some(part)) => {
                    if let Some(slot) = parts.get_mut(index) {
                        slot.clone_from(part);
                    }
                }
                (Some(index), None) => {
                    parts.remove(index);
                }
                (None, Some(part)) => parts.push(part.clone()),
                (None, None) => {}
            }
        }

        let mut categories = confirmed.category_entries().to_vec();

        for (name, expected) in &self.categories {
            categories.retain(|category| &category.name != name);
            categories.extend(expected.clone());
        }

        let mut catalog = Catalog::new();
        catalog.apply_categories_snapshot(categories);
        catalog.apply_parts_snapshot(parts);

        catalog
    }
}

fn upsert<K: PartialEq, V>(entries: &mut Vec<(K, Option<V>)>, key: K, value: Option<V>) {
    entries.retain(|(existing, _)| *existing != key);
    entries.push((key, value));
}

/// Confirmed and tentative catalog state.
#[derive(Debug, Clone, Default)]
pub struct Replica {
    mode: SyncMode,
    confirmed: Catalog,
    staged: Option<Staged>,
    unconfirmed: Unconfirmed,
}

impl Replica {
    /// Create a replica around an initial confirmed catalog.
    pub fn new(mode: SyncMode, confirmed: Catalog) -> Self {
        Self {
            mode,
            confirmed,
            staged: None,
            unconfirmed: Unconfirmed::default(),
        }
    }

    /// Sync mode.
    pub fn mode(&self) -> SyncMode {
        self.mode
    }

    /// The catalog readers should see.
    pub fn view(&self) -> &Catalog {
        match (&self.staged, self.mode) {
            (Some(staged), SyncMode::Optimistic) => &staged.catalog,
            _ => &self.confirmed,
        }
    }

    /// Last state acknowledged by the store.
    pub fn confirmed(&self) -> &Catalog {
        &self.confirmed
    }

    /// The state local mutations build on: the staged catalog if a write is in
    /// flight, otherwise the confirmed catalog plus accepted writes the store
    /// has not pushed back yet.
    pub fn working(&self) -> Catalog {
        match &self.staged {
            Some(staged) => staged.catalog.clone(),
            None if self.unconfirmed.is_empty() => self.confirmed.clone(),
            None => self.unconfirmed.overlay(&self.confirmed),
        }
    }

    /// Whether a mutation is in flight or awaiting its push.
    pub fn has_pending(&self) -> bool {
        self.staged.is_some() || !self.unconfirmed.is_empty()
    }

    /// Apply a local mutation to a copy of the working state.
    ///
    /// # Errors
    ///
    /// Propagates the mutation's [`CatalogError`]; nothing is staged then.
    pub fn stage<F>(&mut self, mutation: F) -> Result<CatalogChange, CatalogError>
    where
        F: FnOnce(&mut Catalog) -> Result<CatalogChange, CatalogError>,
    {
        let mut catalog = self.working();

        let change = mutation(&mut catalog)?;

        self.staged = Some(Staged {
            catalog,
            change: change.clone(),
        });

        Ok(change)
    }

    /// The store accepted every write of the staged mutation.
    ///
    /// Optimistic replicas confirm the staged catalog. Awaiting replicas keep
    /// its documents as unconfirmed until a snapshot carries them.
    pub fn acknowledge(&mut self) {
        let Some(staged) = self.staged.take() else {
            return;
        };

        match self.mode {
            SyncMode::Optimistic => self.confirmed = staged.catalog,
            SyncMode::AwaitConfirmation => self.unconfirmed.record(&staged.change),
        }
    }

    /// A write failed. Drop the staged state.
    pub fn rollback(&mut self) {
        self.staged = None;
    }

    /// Replace the confirmed parts with a store delivery.
    pub fn apply_parts_snapshot(&mut self, parts: Vec<Part>) {
        self.confirmed.apply_parts_snapshot(parts);
        self.unconfirmed.settle_parts(&self.confirmed);
    }

    /// Replace the confirmed categories with a store delivery.
    pub fn apply_categories_snapshot(&mut self, categories: Vec<Category>) {
        self.confirmed.apply_categories_snapshot(categories);
        self.unconfirmed.settle_categories(&self.confirmed);
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;
    use crate::{catalog::InvalidInput, parts::PartData};

    fn replica(mode: SyncMode) -> Replica {
        Replica::new(mode, Catalog::with_contents(["PS5", "PS4"], Vec::new()))
    }

    #[test]
    fn optimistic_view_shows_tentative_state() -> TestResult {
        let mut replica = replica(SyncMode::Optimistic);

        replica.stage(|catalog| catalog.add_category("XBOX"))?;

        assert!(replica.view().has_category("XBOX"));
        assert!(!replica.confirmed().has_category("XBOX"));

        replica.acknowledge();

        assert!(replica.confirmed().has_category("XBOX"));
        assert!(!replica.has_pending());

        Ok(())
    }

    #[test]
    fn awaiting_view_shows_confirmed_state_only() -> TestResult {
        let mut replica = replica(SyncMode::AwaitConfirmation);

        replica.stage(|catalog| catalog.add_category("XBOX"))?;
        assert!(!replica.view().has_category("XBOX"));

        replica.acknowledge();
        assert!(!replica.view().has_category("XBOX"));

        replica.apply_categories_snapshot(vec![
            Category {
                name: "PS5".to_string(),
                position: 0,
            },
            Category {
                name: "PS4".to_string(),
                position: 1,
            },
            Category {
                name: "XBOX".to_string(),
                position: 2,
            },
        ]);

        assert!(replica.view().has_category("XBOX"));

        Ok(())
    }

    fn stick(category: &str) -> PartData {
        PartData {
            name: "Stick".to_string(),
            category: category.to_string(),
            subcategory: "Analog".to_string(),
            price: 450,
            in_stock: true,
            ..PartData::default()
        }
    }

    #[test]
    fn accepted_writes_stay_the_base_until_pushed() -> TestResult {
        let mut replica = replica(SyncMode::AwaitConfirmation);

        replica.stage(|catalog| catalog.add_category("WII"))?;
        replica.acknowledge();

        let change = replica.stage(|catalog| catalog.create_part(stick("WII")))?;
        replica.acknowledge();

        assert_eq!(
            replica.stage(|catalog| catalog.add_category("WII")),
            Err(InvalidInput::DuplicateCategory("WII".to_string()).into())
        );
        assert!(!replica.view().has_category("WII"));
        assert!(replica.has_pending());

        let working = replica.working();
        replica.apply_categories_snapshot(working.category_entries().to_vec());
        assert!(replica.has_pending());

        replica.apply_parts_snapshot(working.parts().to_vec());
        assert!(!replica.has_pending());
        assert!(replica.view().part(change.part().ok_or("created part missing")?.id).is_some());

        Ok(())
    }

    #[test]
    fn rename_then_delete_before_push() -> TestResult {
        let mut replica = replica(SyncMode::AwaitConfirmation);

        replica.stage(|catalog| catalog.rename_category("PS5", "PS5-NEW"))?;
        replica.acknowledge();

        replica.stage(|catalog| catalog.delete_category("PS5-NEW"))?;
        replica.acknowledge();

        let working = replica.working();
        assert_eq!(working.categories().collect::<Vec<_>>(), ["PS4"]);

        Ok(())
    }

    #[test]
    fn unrelated_snapshots_keep_unconfirmed_writes() -> TestResult {
        let mut replica = replica(SyncMode::AwaitConfirmation);

        replica.stage(|catalog| catalog.add_category("WII"))?;
        replica.acknowledge();

        replica.apply_categories_snapshot(vec![
            Category {
                name: "PS5".to_string(),
                position: 0,
            },
            Category {
                name: "XBOX".to_string(),
                position: 5,
            },
        ]);

        let working = replica.working();
        assert_eq!(working.categories().collect::<Vec<_>>(), ["PS5", "WII", "XBOX"]);
        assert!(replica.has_pending());

        Ok(())
    }

    #[test]
    fn rollback_restores_previous_view() -> TestResult {
        let mut replica = replica(SyncMode::Optimistic);
        let before = replica.view().clone();

        replica.stage(|catalog| catalog.delete_category("PS5"))?;
        replica.rollback();

        assert_eq!(replica.view(), &before);

        Ok(())
    }

    #[test]
    fn rejected_mutation_stages_nothing() {
        let mut replica = replica(SyncMode::Optimistic);

        let result = replica.stage(|catalog| catalog.add_category("PS5"));

        assert!(result.is_err());
        assert!(!replica.has_pending());
    }
}
