//! Session-only list of favorite cities. Nothing here is persisted.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Favorites {
    cities: Vec<String>,
}

impl Favorites {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a trimmed city name. Returns `false` for blanks and for names
    /// already present (compared case-insensitively).
    pub fn add(&mut self, city: &str) -> bool {
        let city = city.trim();
        if city.is_empty() || self.contains(city) {
            return false;
        }
        self.cities.push(city.to_string());
        true
    }

    pub fn remove(&mut self, city: &str) -> bool {
        let before = self.cities.len();
        let needle = city.trim();
        self.cities.retain(|c| !c.eq_ignore_ascii_case(needle));
        self.cities.len() != before
    }

    pub fn contains(&self, city: &str) -> bool {
        let needle = city.trim();
        self.cities.iter().any(|c| c.eq_ignore_ascii_case(needle))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.cities.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.cities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_keeps_insertion_order() {
        let mut favs = Favorites::new();
        assert!(favs.add("Oslo"));
        assert!(favs.add(" Lima "));
        assert_eq!(favs.iter().collect::<Vec<_>>(), vec!["Oslo", "Lima"]);
    }

    #[test]
    fn duplicates_and_blanks_are_rejected() {
        let mut favs = Favorites::new();
        assert!(favs.add("Oslo"));
        assert!(!favs.add("oslo"));
        assert!(!favs.add("   "));
        assert_eq!(favs.len(), 1);
    }

    #[test]
    fn remove_is_case_insensitive() {
        let mut favs = Favorites::new();
        favs.add("Oslo");
        assert!(favs.remove("OSLO"));
        assert!(!favs.remove("Oslo"));
        assert!(favs.is_empty());
    }
}
