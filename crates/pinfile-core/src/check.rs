use crate::expand::{EntryKind, FlatEntry, FlatManifest};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Where a package was listed, and what it pinned there.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PinSite {
    pub name: String,
    pub origin: String,
    pub kind: EntryKind,
    pub version: Option<String>,
}

impl PinSite {
    fn from_entry(entry: &FlatEntry) -> Self {
        Self {
            name: entry.canonical_name(),
            origin: entry.origin(),
            kind: entry.kind,
            version: entry.requirement.version.clone(),
        }
    }
}

/// Two or more different exact versions for the same package and marker.
#[derive(Debug, Clone, Serialize)]
pub struct Conflict {
    pub name: String,
    pub marker: Option<String>,
    pub sites: Vec<PinSite>,
}

/// The same package listed more than once in requirements (or in constraints)
/// without disagreeing on the version.
#[derive(Debug, Clone, Serialize)]
pub struct Duplicate {
    pub name: String,
    pub marker: Option<String>,
    pub kind: EntryKind,
    pub sites: Vec<PinSite>,
}

/// Result of checking a flattened manifest for uniqueness.
#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub root: String,
    pub conflicts: Vec<Conflict>,
    pub duplicates: Vec<Duplicate>,
    /// Constraints that no requirement refers to.
    pub unused_constraints: Vec<PinSite>,
    /// Requirements left without any version, by name.
    pub unpinned: Vec<String>,
    pub has_conflicts: bool,
}

impl CheckReport {
    /// Conflicts always fail a check; unpinned requirements fail it only when disallowed.
    pub fn passes(&self, allow_unpinned: bool) -> bool {
        !self.has_conflicts && (allow_unpinned || self.unpinned.is_empty())
    }
}

type GroupKey = (String, Option<String>);

/// Every entry that bounds one package under one marker.
pub(crate) struct PinGroup<'a> {
    pub name: String,
    /// Canonical marker spelling, `None` for unconditional entries.
    pub marker: Option<String>,
    /// Entries listed under exactly this marker, with their reading position.
    own: Vec<(usize, &'a FlatEntry)>,
    /// Unmarked constraints on the same package. A constraint bounds the
    /// package under every marker, so marked requirements pick these up.
    inherited: Vec<(usize, &'a FlatEntry)>,
}

impl<'a> PinGroup<'a> {
    pub fn own(&self) -> impl Iterator<Item = &'a FlatEntry> + '_ {
        self.own.iter().map(|(_, e)| *e)
    }

    pub fn is_required(&self) -> bool {
        self.own().any(|e| e.kind == EntryKind::Requirement)
    }

    pub fn inherits_constraints(&self) -> bool {
        !self.inherited.is_empty()
    }

    /// Own and inherited entries together, in reading order.
    pub fn pinning(&self) -> Vec<&'a FlatEntry> {
        let mut all: Vec<(usize, &'a FlatEntry)> =
            self.own.iter().chain(&self.inherited).copied().collect();
        all.sort_by_key(|(index, _)| *index);
        all.into_iter().map(|(_, e)| e).collect()
    }

    /// Distinct pinned versions, sorted.
    pub fn versions(&self) -> BTreeSet<&'a str> {
        self.pinning()
            .into_iter()
            .filter_map(|e| e.requirement.version.as_deref())
            .collect()
    }
}

/// Group flattened entries by canonical name and canonical marker.
///
/// Groups come out sorted by key. A marked group that holds a requirement
/// also inherits the unmarked constraints on its package.
pub(crate) fn group_entries(flat: &FlatManifest) -> Vec<PinGroup<'_>> {
    let mut keyed: BTreeMap<GroupKey, Vec<(usize, &FlatEntry)>> = BTreeMap::new();
    for (index, entry) in flat.entries.iter().enumerate() {
        keyed
            .entry((entry.canonical_name(), entry.requirement.marker_key()))
            .or_default()
            .push((index, entry));
    }

    let mut groups: Vec<PinGroup<'_>> = keyed
        .into_iter()
        .map(|((name, marker), own)| PinGroup {
            name,
            marker,
            own,
            inherited: Vec::new(),
        })
        .collect();

    let unmarked_constraints: BTreeMap<String, Vec<(usize, &FlatEntry)>> = groups
        .iter()
        .filter(|g| g.marker.is_none())
        .map(|g| {
            let constraints = g
                .own
                .iter()
                .filter(|(_, e)| e.kind == EntryKind::Constraint)
                .copied()
                .collect();
            (g.name.clone(), constraints)
        })
        .collect();

    for group in &mut groups {
        if group.marker.is_some() && group.is_required() {
            if let Some(constraints) = unmarked_constraints.get(&group.name) {
                group.inherited.clone_from(constraints);
            }
        }
    }
    groups
}

/// Check that no package ends up with conflicting pins after expansion.
pub fn check(flat: &FlatManifest) -> CheckReport {
    let mut conflicts = Vec::new();
    let mut duplicates = Vec::new();
    let mut unused_constraints = Vec::new();
    let mut unpinned = Vec::new();

    let groups = group_entries(flat);
    let lent: BTreeSet<&str> = groups
        .iter()
        .filter(|g| g.inherits_constraints())
        .map(|g| g.name.as_str())
        .collect();

    for group in &groups {
        let versions = group.versions();

        if versions.len() > 1 {
            conflicts.push(Conflict {
                name: group.name.clone(),
                marker: group.marker.clone(),
                sites: group
                    .pinning()
                    .into_iter()
                    .filter(|e| e.requirement.is_pinned())
                    .map(PinSite::from_entry)
                    .collect(),
            });
        } else {
            for kind in [EntryKind::Requirement, EntryKind::Constraint] {
                let same_kind: Vec<PinSite> = group
                    .own()
                    .filter(|e| e.kind == kind)
                    .map(PinSite::from_entry)
                    .collect();
                if same_kind.len() > 1 {
                    duplicates.push(Duplicate {
                        name: group.name.clone(),
                        marker: group.marker.clone(),
                        kind,
                        sites: same_kind,
                    });
                }
            }
        }

        if group.is_required() {
            if versions.is_empty() {
                unpinned.push(group.name.clone());
            }
        } else if group.marker.is_some() || !lent.contains(group.name.as_str()) {
            unused_constraints.extend(group.own().map(PinSite::from_entry));
        }
    }

    let has_conflicts = !conflicts.is_empty();
    CheckReport {
        root: flat.root.display().to_string(),
        conflicts,
        duplicates,
        unused_constraints,
        unpinned,
        has_conflicts,
    }
}
