//! Named positions on a timeline

use indexmap::IndexMap;

/// A named position, in milliseconds (or ticks)
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub name: String,
    pub position: f64,
}

/// Label storage with a lazily rebuilt, position-sorted view
#[derive(Debug, Default)]
pub struct LabelTable {
    positions: IndexMap<String, f64>,
    sorted: Option<Vec<Label>>,
}

impl LabelTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or move a label. A cached sorted view is patched in place.
    pub fn add(&mut self, name: &str, position: f64) {
        self.positions.insert(name.to_string(), position);
        if let Some(list) = &mut self.sorted {
            list.retain(|label| label.name != name);
            let index = list
                .iter()
                .position(|label| position < label.position)
                .unwrap_or(list.len());
            list.insert(
                index,
                Label {
                    name: name.to_string(),
                    position,
                },
            );
        }
    }

    /// Replace every label
    pub fn set_all<I, S>(&mut self, labels: I)
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        self.positions = labels.into_iter().map(|(name, pos)| (name.into(), pos)).collect();
        self.sorted = None;
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.positions.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Labels ordered by ascending position
    pub fn sorted(&mut self) -> &[Label] {
        let positions = &self.positions;
        self.sorted.get_or_insert_with(|| {
            let mut list: Vec<Label> = positions
                .iter()
                .map(|(name, &position)| Label {
                    name: name.clone(),
                    position,
                })
                .collect();
            list.sort_by(|a, b| a.position.total_cmp(&b.position));
            list
        })
    }

    /// The last label at or before `position`
    pub fn current(&mut self, position: f64) -> Option<String> {
        let list = self.sorted();
        let index = list
            .iter()
            .position(|label| position < label.position)
            .unwrap_or(list.len());
        index.checked_sub(1).map(|i| list[i].name.clone())
    }
}
