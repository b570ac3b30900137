//! In-memory roster: sections of entity records

use std::collections::BTreeSet;

/// One station of the roster
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityRecord {
    /// Station name, unique within its section
    pub name: String,

    /// Candidate website, may be empty or invalid
    pub site_url: String,

    /// Addresses on the site's own domain
    pub domain_emails: BTreeSet<String>,

    /// Other addresses found on the site
    pub unsure_emails: BTreeSet<String>,
}

impl EntityRecord {
    pub fn new(name: impl Into<String>, site_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            site_url: site_url.into(),
            ..Self::default()
        }
    }

    /// Returns true if at least one address is on record
    pub fn has_mail(&self) -> bool {
        !self.domain_emails.is_empty() || !self.unsure_emails.is_empty()
    }

    /// Adds addresses to the record; nothing is ever removed
    ///
    /// Addresses are lowercased so that duplicates differing only in case
    /// collapse. Unsure addresses are only added while the record has no
    /// domain address.
    pub fn merge_emails<'a, D, U>(&mut self, domain: D, unsure: U)
    where
        D: IntoIterator<Item = &'a String>,
        U: IntoIterator<Item = &'a String>,
    {
        self.domain_emails
            .extend(domain.into_iter().map(|email| normalize_email(email)));

        if self.domain_emails.is_empty() {
            self.unsure_emails
                .extend(unsure.into_iter().map(|email| normalize_email(email)));
        }
    }

    /// Unions both address sets of `other` into this record as they are
    ///
    /// Used to reconcile two stored copies of the same record, where
    /// neither side may lose an address.
    pub fn union_emails(&mut self, other: &EntityRecord) {
        self.domain_emails
            .extend(other.domain_emails.iter().cloned());
        self.unsure_emails
            .extend(other.unsure_emails.iter().cloned());
    }
}

/// Canonical form of an address for deduplication
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// A named group of stations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    pub entities: Vec<EntityRecord>,
}

/// Ordered sections of entity records
///
/// Sections keep their insertion order and are never reordered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    sections: Vec<Section>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Returns the named section, creating it at the end if needed
    pub fn section_mut(&mut self, name: &str) -> &mut Section {
        let index = match self.sections.iter().position(|s| s.name == name) {
            Some(index) => index,
            None => {
                self.sections.push(Section {
                    name: name.to_string(),
                    entities: Vec::new(),
                });
                self.sections.len() - 1
            }
        };
        &mut self.sections[index]
    }

    /// All entities, section by section, in roster order
    pub fn entities(&self) -> impl Iterator<Item = &EntityRecord> {
        self.sections.iter().flat_map(|s| s.entities.iter())
    }

    pub fn len(&self) -> usize {
        self.sections.iter().map(|s| s.entities.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Merges new addresses into every entity named `name`
    ///
    /// Returns the number of entities that matched.
    pub fn apply(
        &mut self,
        name: &str,
        domain: &BTreeSet<String>,
        unsure: &BTreeSet<String>,
    ) -> usize {
        let mut matched = 0;
        for entity in self
            .sections
            .iter_mut()
            .flat_map(|s| s.entities.iter_mut())
            .filter(|e| e.name == name)
        {
            entity.merge_emails(domain, unsure);
            matched += 1;
        }
        matched
    }

    /// Unions `other` into this roster, keyed by section and entity name
    ///
    /// Sections and entities unknown to this roster are appended.
    pub fn merge_from(&mut self, other: &Roster) {
        for other_section in &other.sections {
            let section = self.section_mut(&other_section.name);
            for other_entity in &other_section.entities {
                match section
                    .entities
                    .iter_mut()
                    .find(|e| e.name == other_entity.name)
                {
                    Some(entity) => {
                        entity.union_emails(other_entity);
                        if entity.site_url.is_empty() {
                            entity.site_url = other_entity.site_url.clone();
                        }
                    }
                    None => section.entities.push(other_entity.clone()),
                }
            }
        }
    }
}
