//! Random UFL instances in clusters of similar size.

use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use crate::error::ValidationError;
use crate::instance::Instance;

#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("Invalid range for {what}: [{min}, {max}]")]
    InvalidRange { what: &'static str, min: u64, max: u64 },
    #[error("IO error writing {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Shape of one cluster of generated instances. Ranges are inclusive
/// `[min, max]` pairs; costs are drawn as integers.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterSpec {
    pub name: String,
    pub instances: usize,
    pub facilities: (usize, usize),
    pub customers: (usize, usize),
    pub fixed_cost: (u64, u64),
    pub assignment_cost: (u64, u64),
}

impl ClusterSpec {
    fn validate(&self) -> Result<(), GeneratorError> {
        check_range("facilities", self.facilities.0 as u64, self.facilities.1 as u64)?;
        check_range("customers", self.customers.0 as u64, self.customers.1 as u64)?;
        check_range("fixed_cost", self.fixed_cost.0, self.fixed_cost.1)?;
        check_range("assignment_cost", self.assignment_cost.0, self.assignment_cost.1)?;
        if self.facilities.0 == 0 {
            return Err(GeneratorError::InvalidRange {
                what: "facilities",
                min: 0,
                max: self.facilities.1 as u64,
            });
        }
        Ok(())
    }
}

fn check_range(what: &'static str, min: u64, max: u64) -> Result<(), GeneratorError> {
    if min > max {
        Err(GeneratorError::InvalidRange { what, min, max })
    } else {
        Ok(())
    }
}

/// Draw one instance with sizes and costs uniform in the cluster's ranges
pub fn generate_instance<R: Rng + ?Sized>(spec: &ClusterSpec, rng: &mut R) -> Result<Instance, GeneratorError> {
    spec.validate()?;
    let p = rng.random_range(spec.facilities.0..=spec.facilities.1);
    let r = rng.random_range(spec.customers.0..=spec.customers.1);
    let fixed = (0..p)
        .map(|_| rng.random_range(spec.fixed_cost.0..=spec.fixed_cost.1) as f64)
        .collect();
    let assign = (0..r)
        .map(|_| {
            (0..p)
                .map(|_| rng.random_range(spec.assignment_cost.0..=spec.assignment_cost.1) as f64)
                .collect()
        })
        .collect();
    Ok(Instance::new(p, r, fixed, assign)?)
}

/// All instances of a cluster, reproducible from `seed`
pub fn generate_cluster(spec: &ClusterSpec, seed: u64) -> Result<Vec<Instance>, GeneratorError> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..spec.instances).map(|_| generate_instance(spec, &mut rng)).collect()
}

/// Write a cluster to `<dir>/<name>/inst_<name>_<k>.txt`, `k` from 1
pub fn write_cluster(spec: &ClusterSpec, dir: impl AsRef<Path>, seed: u64) -> Result<Vec<PathBuf>, GeneratorError> {
    let cluster_dir = dir.as_ref().join(&spec.name);
    std::fs::create_dir_all(&cluster_dir).map_err(|source| GeneratorError::Io {
        path: cluster_dir.display().to_string(),
        source,
    })?;

    let mut written = Vec::with_capacity(spec.instances);
    for (k, instance) in generate_cluster(spec, seed)?.iter().enumerate() {
        let path = cluster_dir.join(format!("inst_{}_{}.txt", spec.name, k + 1));
        std::fs::write(&path, instance.to_orlib_string()).map_err(|source| GeneratorError::Io {
            path: path.display().to_string(),
            source,
        })?;
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> ClusterSpec {
        ClusterSpec {
            name: "small".to_string(),
            instances: 3,
            facilities: (2, 4),
            customers: (3, 5),
            fixed_cost: (10, 20),
            assignment_cost: (1, 9),
        }
    }

    #[test]
    fn test_sizes_and_costs_within_ranges() {
        for instance in generate_cluster(&spec(), 7).unwrap() {
            assert!((2..=4).contains(&instance.num_facilities()));
            assert!((3..=5).contains(&instance.num_customers()));
            assert!(instance.fixed_costs().iter().all(|&c| (10.0..=20.0).contains(&c)));
            assert!(
                instance
                    .assignment_costs()
                    .iter()
                    .flatten()
                    .all(|&c| (1.0..=9.0).contains(&c) && c.fract() == 0.0)
            );
        }
    }

    #[test]
    fn test_seed_reproducible() {
        assert_eq!(generate_cluster(&spec(), 42).unwrap(), generate_cluster(&spec(), 42).unwrap());
    }

    #[test]
    fn test_invalid_ranges() {
        let mut bad = spec();
        bad.customers = (5, 3);
        assert!(matches!(
            generate_cluster(&bad, 1),
            Err(GeneratorError::InvalidRange { what: "customers", .. })
        ));
        bad = spec();
        bad.facilities = (0, 2);
        assert!(matches!(
            generate_cluster(&bad, 1),
            Err(GeneratorError::InvalidRange { what: "facilities", .. })
        ));
    }

    #[test]
    fn test_write_cluster_layout() {
        let dir = std::env::temp_dir().join(format!("ufl-gomory-gen-{}", std::process::id()));
        let paths = write_cluster(&spec(), &dir, 3).unwrap();
        assert_eq!(paths.len(), 3);
        assert!(paths[0].ends_with("small/inst_small_1.txt"));
        let loaded = Instance::from_file(&paths[2]).unwrap();
        assert_eq!(loaded, generate_cluster(&spec(), 3).unwrap()[2]);
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
