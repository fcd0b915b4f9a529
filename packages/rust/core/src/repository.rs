//! Funding-program storage behind a trait.

use tracing::debug;

use docstruct_shared::{DocStructError, FundingProgram, Result};

/// Where funding programs come from. Implementations own their state.
pub trait ProgramRepository {
    fn get(&self, id: &str) -> Option<&FundingProgram>;

    /// Fails with `Validation` when the ID is already taken.
    fn add(&mut self, program: FundingProgram) -> Result<()>;

    /// Fails with `NotFound` for an unknown ID.
    fn remove(&mut self, id: &str) -> Result<FundingProgram>;

    /// Replace the program with the same ID. Fails with `NotFound`.
    fn update(&mut self, program: FundingProgram) -> Result<()>;

    /// Case-insensitive match on ID, name, or any funding type.
    fn search(&self, query: &str) -> Vec<&FundingProgram>;
}

/// Insertion-ordered in-memory repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProgramRepository {
    programs: Vec<FundingProgram>,
}

impl InMemoryProgramRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.programs.iter().position(|p| p.id == id)
    }
}

impl FromIterator<FundingProgram> for InMemoryProgramRepository {
    fn from_iter<I: IntoIterator<Item = FundingProgram>>(iter: I) -> Self {
        let mut repo = Self::new();
        for program in iter {
            // later duplicates replace earlier ones
            match repo.position(&program.id) {
                Some(idx) => repo.programs[idx] = program,
                None => repo.programs.push(program),
            }
        }
        repo
    }
}

impl ProgramRepository for InMemoryProgramRepository {
    fn get(&self, id: &str) -> Option<&FundingProgram> {
        self.programs.iter().find(|p| p.id == id)
    }

    fn add(&mut self, program: FundingProgram) -> Result<()> {
        if self.position(&program.id).is_some() {
            return Err(DocStructError::validation(format!(
                "program '{}' already exists",
                program.id
            )));
        }
        debug!(id = %program.id, "program added");
        self.programs.push(program);
        Ok(())
    }

    fn remove(&mut self, id: &str) -> Result<FundingProgram> {
        let idx = self
            .position(id)
            .ok_or_else(|| DocStructError::not_found(format!("program '{id}'")))?;
        debug!(id, "program removed");
        Ok(self.programs.remove(idx))
    }

    fn update(&mut self, program: FundingProgram) -> Result<()> {
        let idx = self
            .position(&program.id)
            .ok_or_else(|| DocStructError::not_found(format!("program '{}'", program.id)))?;
        self.programs[idx] = program;
        Ok(())
    }

    fn search(&self, query: &str) -> Vec<&FundingProgram> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.programs.iter().collect();
        }
        self.programs
            .iter()
            .filter(|p| {
                p.id.to_lowercase().contains(&needle)
                    || p.name.to_lowercase().contains(&needle)
                    || p.funding_types
                        .iter()
                        .any(|t| t.to_lowercase().contains(&needle))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docstruct_shared::ApplicationRequirements;

    fn program(id: &str, name: &str, types: &[&str]) -> FundingProgram {
        FundingProgram {
            id: id.into(),
            name: name.into(),
            funding_types: types.iter().map(|t| t.to_string()).collect(),
            application_requirements: ApplicationRequirements::default(),
            requirements: Vec::new(),
            analysis: None,
        }
    }

    #[test]
    fn add_get_remove() {
        let mut repo = InMemoryProgramRepository::new();
        repo.add(program("p1", "Seed Grant", &["grant"])).expect("add");
        assert_eq!(repo.get("p1").map(|p| p.name.as_str()), Some("Seed Grant"));

        let err = repo.add(program("p1", "Other", &[])).unwrap_err();
        assert!(matches!(err, DocStructError::Validation { .. }));

        let removed = repo.remove("p1").expect("remove");
        assert_eq!(removed.id, "p1");
        assert!(repo.is_empty());
        assert!(matches!(repo.remove("p1"), Err(DocStructError::NotFound(_))));
    }

    #[test]
    fn update_requires_existing() {
        let mut repo = InMemoryProgramRepository::new();
        assert!(repo.update(program("p1", "Seed", &[])).is_err());

        repo.add(program("p1", "Seed", &[])).expect("add");
        repo.update(program("p1", "Seed Plus", &[])).expect("update");
        assert_eq!(repo.get("p1").map(|p| p.name.as_str()), Some("Seed Plus"));
    }

    #[test]
    fn search_matches_id_name_and_type() {
        let repo: InMemoryProgramRepository = [
            program("aws-seed", "Seed Grant", &["grant"]),
            program("ffg-basis", "Basisprogramm", &["loan", "grant"]),
            program("eu-eic", "Accelerator", &["equity"]),
        ]
        .into_iter()
        .collect();

        let ids = |q: &str| -> Vec<String> { repo.search(q).iter().map(|p| p.id.clone()).collect() };
        assert_eq!(ids("GRANT"), vec!["aws-seed", "ffg-basis"]);
        assert_eq!(ids("accel"), vec!["eu-eic"]);
        assert_eq!(ids("ffg"), vec!["ffg-basis"]);
        assert_eq!(ids("").len(), 3);
    }
}
