use approx::assert_abs_diff_eq;
use pem_core::models::{FunctionSpec, Market, Params, Tariff, TariffOutcome};
use pem_solver::{
    EquilibriumEngine, Quadrature, RootError, RootFinder, SolveError, Stage, WelfareEngine, invert,
};
use rstest::*;
use rstest_reuse::{self, *};

use all_root_finders::all_root_finders;

// The default parameter set: D = 20 - 15p, S = -1 + 10p, X = -2 + 15p
fn linear() -> Market {
    Params::default().market()
}

// D = 20 p^-0.5, S = 5 p^0.5, X = 5 p
fn log_linear() -> Market {
    Market {
        home_demand: FunctionSpec::log_linear(20.0, -0.5),
        home_supply: FunctionSpec::log_linear(5.0, 0.5),
        foreign_supply: FunctionSpec::log_linear(5.0, 1.0),
    }
}

// The default market with every quantity multiplied by `k`; prices are unchanged
fn scaled(k: f64) -> Market {
    Market {
        home_demand: FunctionSpec::linear(20.0 * k, -15.0 * k),
        home_supply: FunctionSpec::linear(-1.0 * k, 10.0 * k),
        foreign_supply: FunctionSpec::linear(-2.0 * k, 15.0 * k),
    }
}

#[apply(all_root_finders)]
#[rstest]
fn linear_curves_invert(
    solver: impl RootFinder,
    #[values(
        FunctionSpec::linear(20.0, -15.0),
        FunctionSpec::linear(-1.0, 10.0),
        FunctionSpec::linear(-2.0, 15.0),
        FunctionSpec::linear(3.0, 0.5)
    )]
    spec: FunctionSpec,
    #[values(-2.0, 0.0, 0.575, 7.5)] x: f64,
) {
    let recovered = invert(&solver, |p| spec.evaluate(p), spec.evaluate(x)).unwrap();
    assert_abs_diff_eq!(recovered, x, epsilon = 1e-8);
}

#[apply(all_root_finders)]
#[rstest]
fn zero_tariff_is_free_trade(
    solver: impl RootFinder,
    #[values(linear(), log_linear())] market: Market,
) {
    let engine = EquilibriumEngine::new(market, solver);
    let free = engine.free_trade_equilibrium().unwrap();

    for tariff in [Tariff::ad_valorem(0.0), Tariff::specific(0.0)] {
        let outcome = engine.tariff_equilibrium(&tariff).unwrap();
        let eq = outcome.equilibrium().unwrap();
        assert_abs_diff_eq!(eq.home_price, free.price, epsilon = 1e-8);
        assert_abs_diff_eq!(eq.export_price, free.price, epsilon = 1e-8);
        assert_abs_diff_eq!(eq.import_quantity, free.quantity, epsilon = 1e-8);
    }
}

#[apply(all_root_finders)]
#[rstest]
fn log_linear_equilibria(solver: impl RootFinder) {
    let engine = EquilibriumEngine::new(log_linear(), solver);

    // 20 p^-0.5 = 5 p^0.5
    let autarky = engine.no_trade_equilibrium().unwrap();
    assert_abs_diff_eq!(autarky.price, 4.0, epsilon = 1e-8);
    assert_abs_diff_eq!(autarky.quantity, 10.0, epsilon = 1e-8);

    let free = engine.free_trade_equilibrium().unwrap();
    assert_abs_diff_eq!(free.price, 1.72816, epsilon = 1e-4);
    assert_abs_diff_eq!(free.quantity, 5.0 * free.price, epsilon = 1e-8);

    let outcome = engine
        .tariff_equilibrium(&Tariff::ad_valorem(0.2))
        .unwrap();
    let eq = outcome.equilibrium().unwrap();
    assert_abs_diff_eq!(eq.home_price, 1.90182, epsilon = 1e-4);
    assert_abs_diff_eq!(eq.export_price, 0.8 * eq.home_price, epsilon = 1e-8);
    assert_abs_diff_eq!(eq.import_quantity, 7.6073, epsilon = 1e-3);
    assert_abs_diff_eq!(eq.autarky_price, 4.0, epsilon = 1e-8);
}

#[apply(all_root_finders)]
#[rstest]
fn imports_fall_as_the_tariff_rises(solver: impl RootFinder) {
    let engine = EquilibriumEngine::new(linear(), solver);
    let mut tariff = Tariff::ad_valorem(0.0);
    let mut previous = f64::INFINITY;

    loop {
        match engine.tariff_equilibrium(&tariff).unwrap() {
            TariffOutcome::Traded(eq) => {
                assert!(eq.import_quantity < previous);
                previous = eq.import_quantity;
            }
            TariffOutcome::Prohibitive {
                import_quantity, ..
            } => {
                assert!(import_quantity <= engine.epsilon());
                break;
            }
        }
        *tariff.value_mut() += 0.05;
        assert!(tariff.value() < 1.0, "trade was never choked off");
    }
}

#[apply(all_root_finders)]
#[rstest]
fn default_tariff_reduces_imports(solver: impl RootFinder) {
    let params = Params::default();
    let engine = EquilibriumEngine::new(params.market(), solver);
    let welfare = WelfareEngine::new(params.market(), Quadrature::default());

    let free = engine.free_trade_equilibrium().unwrap();
    let outcome = engine.tariff_equilibrium(&params.tariff()).unwrap();
    let eq = outcome.equilibrium().unwrap();

    assert!(eq.import_quantity > 0.0);
    assert!(eq.import_quantity < free.quantity);

    let report = welfare
        .home_welfare(free.price, eq.home_price, eq.export_price)
        .unwrap();
    assert!(report.total.is_finite());
    // a small tariff improves the welfare of a large country
    assert!(report.total > 0.0);
}

#[apply(all_root_finders)]
#[rstest]
fn welfare_identities_hold_exactly(
    solver: impl RootFinder,
    #[values(linear(), log_linear())] market: Market,
    #[values(Tariff::ad_valorem(0.3), Tariff::specific(0.1))] tariff: Tariff,
) {
    let engine = EquilibriumEngine::new(market, solver);
    let welfare = WelfareEngine::new(market, Quadrature::default());

    let free = engine.free_trade_equilibrium().unwrap();
    let outcome = engine.tariff_equilibrium(&tariff).unwrap();
    let eq = outcome.equilibrium().unwrap();
    let report = welfare
        .home_welfare(free.price, eq.home_price, eq.export_price)
        .unwrap();

    assert_eq!(
        report.deadweight_loss,
        report.d_consumer_surplus + report.d_producer_surplus + report.d_tariff_revenue
    );
    assert_eq!(report.total, report.deadweight_loss + report.terms_of_trade);

    // consumers lose, producers gain, the exporter absorbs part of the tariff
    assert!(report.d_consumer_surplus < 0.0);
    assert!(report.d_producer_surplus > 0.0);
    assert!(report.terms_of_trade > 0.0);

    let foreign = welfare.foreign_welfare(free.price, eq.export_price).unwrap();
    let world = welfare.world_welfare(&report, &foreign);
    assert_abs_diff_eq!(foreign.terms_of_trade, -report.terms_of_trade, epsilon = 1e-8);
    assert!(world.net_world < 0.0);
}

#[apply(all_root_finders)]
#[rstest]
fn constant_elasticities_are_recovered(solver: impl RootFinder) {
    let engine = EquilibriumEngine::new(log_linear(), solver);
    let outcome = engine
        .tariff_equilibrium(&Tariff::ad_valorem(0.2))
        .unwrap();
    let el = engine.elasticities(outcome.equilibrium().unwrap());

    assert_abs_diff_eq!(el.home_demand, -0.5, epsilon = 1e-5);
    assert_abs_diff_eq!(el.home_supply, 0.5, epsilon = 1e-5);
    assert_abs_diff_eq!(el.export_supply, 1.0, epsilon = 1e-5);
    // import demand is more elastic than home demand alone
    assert!(el.import_demand < el.home_demand);
}

#[apply(all_root_finders)]
#[rstest]
fn log_linear_schedule_range(solver: impl RootFinder) {
    let engine = EquilibriumEngine::new(log_linear(), solver);
    let schedule = engine.market_schedule(None, 20).unwrap();

    // demand is 4 x 10 at p = 0.25; export supply is 3 x free-trade imports at 3 pw
    let first = schedule.rows.first().unwrap();
    let last = schedule.rows.last().unwrap();
    assert_abs_diff_eq!(first.price, 0.25, epsilon = 1e-8);
    assert_abs_diff_eq!(last.price, 3.0 * schedule.free_trade.price, epsilon = 1e-8);
    assert!(schedule.rows.iter().all(|row| row.tariff_export_supply.is_none()));
    assert!(
        schedule
            .rows
            .windows(2)
            .all(|pair| pair[0].home_demand > pair[1].home_demand)
    );
}

#[apply(all_root_finders)]
#[rstest]
fn prices_do_not_depend_on_the_quantity_scale(
    solver: impl RootFinder,
    #[values(1e4, 1e8, 1e10)] k: f64,
) {
    let engine = EquilibriumEngine::new(scaled(k), solver);

    let autarky = engine.no_trade_equilibrium().unwrap();
    assert_abs_diff_eq!(autarky.price, 0.84, epsilon = 1e-9);

    let free = engine.free_trade_equilibrium().unwrap();
    assert_abs_diff_eq!(free.price, 0.575, epsilon = 1e-9);
    assert_abs_diff_eq!(free.quantity / k, 6.625, epsilon = 1e-8);

    let outcome = engine
        .tariff_equilibrium(&Tariff::ad_valorem(0.2))
        .unwrap();
    let eq = outcome.equilibrium().unwrap();
    assert_abs_diff_eq!(eq.home_price, 23.0 / 37.0, epsilon = 1e-9);
    assert_abs_diff_eq!(eq.export_price, 0.8 * 23.0 / 37.0, epsilon = 1e-9);
}

// Export supply so large that import demand never meets it: -79 - 40p for every p > 0
fn glutted() -> Market {
    Market {
        foreign_supply: FunctionSpec::linear(100.0, 15.0),
        ..linear()
    }
}

#[apply(all_root_finders)]
#[rstest]
fn missing_free_trade_equilibrium_is_reported(solver: impl RootFinder) {
    let engine = EquilibriumEngine::new(glutted(), solver);

    // the home market alone still clears
    assert_abs_diff_eq!(engine.no_trade_equilibrium().unwrap().price, 0.84, epsilon = 1e-9);

    let err = engine.free_trade_equilibrium().unwrap_err();
    assert!(matches!(
        err,
        SolveError::NoSolution {
            stage: Stage::FreeTrade,
            source: RootError::NoBracket { .. },
        }
    ));
    assert!(err.to_string().starts_with("no free-trade equilibrium found"));
}

#[apply(all_root_finders)]
#[rstest]
fn missing_tariff_equilibrium_is_reported(
    solver: impl RootFinder,
    #[values(Tariff::ad_valorem(0.2), Tariff::specific(0.1))] tariff: Tariff,
) {
    let engine = EquilibriumEngine::new(glutted(), solver);
    let err = engine.tariff_equilibrium(&tariff).unwrap_err();
    assert!(matches!(
        err,
        SolveError::NoSolution {
            stage: Stage::Tariff,
            ..
        }
    ));
}

#[apply(all_root_finders)]
#[rstest]
fn unreachable_export_quantity_is_reported(solver: impl RootFinder) {
    // constant-elasticity export supply is positive at every price
    let engine = EquilibriumEngine::new(log_linear(), solver);
    let err = engine.export_price_from_quantity(-1.0).unwrap_err();
    assert!(matches!(
        err,
        SolveError::NoSolution {
            stage: Stage::ExportPrice,
            ..
        }
    ));
    assert!(err.to_string().starts_with("no export price found"));
}
