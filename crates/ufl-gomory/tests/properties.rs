use proptest::prelude::*;

use ufl_gomory::{
    EngineConfig, Instance, LpRelaxation, LpStatus, ProblemData, Sense, assignment_index, enumerate_optimum,
    solve_with_cutting_planes,
};

fn small_instance() -> impl Strategy<Value = Instance> {
    (1usize..=4, 1usize..=4).prop_flat_map(|(p, r)| {
        (
            prop::collection::vec(0u32..20, p),
            prop::collection::vec(prop::collection::vec(0u32..10, p), r),
        )
            .prop_map(move |(fixed, assign)| {
                Instance::new(
                    p,
                    r,
                    fixed.into_iter().map(f64::from).collect(),
                    assign
                        .into_iter()
                        .map(|row| row.into_iter().map(f64::from).collect())
                        .collect(),
                )
                .unwrap()
            })
    })
}

/// One feasible 0/1 point per non-empty open set, each customer at its
/// cheapest open facility
fn integer_points(instance: &Instance) -> Vec<Vec<f64>> {
    let p = instance.num_facilities();
    let r = instance.num_customers();
    (1u32..(1 << p))
        .map(|mask| {
            let mut point = vec![0.0; p + p * r];
            for u in (0..p).filter(|u| mask & (1 << u) != 0) {
                point[u] = 1.0;
            }
            for (v, row) in instance.assignment_costs().iter().enumerate() {
                let u = (0..p)
                    .filter(|u| mask & (1 << u) != 0)
                    .min_by(|&a, &b| row[a].total_cmp(&row[b]))
                    .unwrap();
                point[assignment_index(p, r, u, v)] = 1.0;
            }
            point
        })
        .collect()
}

fn loaded_session(data: &ProblemData) -> gomory_lp::Session {
    let mut session = data.relaxation();
    for ((row, &rhs), name) in data.matrix.iter().zip(&data.rhs).zip(&data.row_names) {
        let sparse: Vec<(usize, f64)> = row.iter().copied().enumerate().filter(|&(_, a)| a != 0.0).collect();
        LpRelaxation::add_constraint(&mut session, &sparse, Sense::Le, rhs, name).unwrap();
    }
    session
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn cuts_never_remove_integer_points(instance in small_instance()) {
        let reference = enumerate_optimum(&instance).unwrap();
        let config = EngineConfig::default().with_max_iterations(20);
        let report = solve_with_cutting_planes(&instance, reference.cost, config).unwrap();

        let data = ProblemData::from_instance(&instance);
        let points = integer_points(&instance);
        for point in points.iter().chain(std::iter::once(&reference.to_point())) {
            prop_assert!(data.is_feasible(point, 1e-9));
            for cut in &report.cuts {
                prop_assert!(cut.is_satisfied_by(point, 1e-6), "{} cuts off {:?}", cut.name, point);
            }
        }
    }

    #[test]
    fn relative_gap_never_grows(instance in small_instance()) {
        let reference = enumerate_optimum(&instance).unwrap();
        let config = EngineConfig::default().with_max_iterations(20);
        let report = solve_with_cutting_planes(&instance, reference.cost, config).unwrap();

        for pair in report.records.windows(2) {
            prop_assert!(pair[1].relative_gap <= pair[0].relative_gap + 1e-6);
            prop_assert!(pair[1].objective >= pair[0].objective - 1e-6);
        }
        for record in &report.records {
            prop_assert!(record.objective <= reference.cost + 1e-6 * (1.0 + reference.cost));
        }
    }

    #[test]
    fn runs_terminate_within_the_iteration_budget(instance in small_instance(), budget in 0usize..6) {
        let reference = enumerate_optimum(&instance).unwrap();
        let config = EngineConfig::default().with_max_iterations(budget);
        let report = solve_with_cutting_planes(&instance, reference.cost, config).unwrap();

        prop_assert!(report.state.is_terminal());
        prop_assert!(report.records.len() <= budget + 1);
        prop_assert_eq!(report.records.last().map(|r| r.status), Some(report.state));
    }

    #[test]
    fn redundant_cuts_change_nothing(instance in small_instance(), customer in 0usize..4) {
        let data = ProblemData::from_instance(&instance);
        let mut session = loaded_session(&data);
        prop_assert_eq!(LpRelaxation::solve(&mut session).unwrap(), LpStatus::Optimal);
        let before = LpRelaxation::objective_value(&session).unwrap();

        // Each customer is assigned at least once already
        let p = instance.num_facilities();
        let r = instance.num_customers();
        let v = customer % r;
        let redundant: Vec<(usize, f64)> = (0..p).map(|u| (assignment_index(p, r, u, v), 1.0)).collect();
        LpRelaxation::add_constraint(&mut session, &redundant, Sense::Ge, 0.5, "redundant").unwrap();
        prop_assert_eq!(LpRelaxation::solve(&mut session).unwrap(), LpStatus::Optimal);
        let after = LpRelaxation::objective_value(&session).unwrap();
        prop_assert!((after - before).abs() <= 1e-9 * (1.0 + before.abs()));

        LpRelaxation::remove_constraint(&mut session, "redundant").unwrap();
        prop_assert_eq!(LpRelaxation::solve(&mut session).unwrap(), LpStatus::Optimal);
        prop_assert!((LpRelaxation::objective_value(&session).unwrap() - before).abs() <= 1e-9 * (1.0 + before.abs()));
    }
}
