mod function;
mod market;
mod outcome;
mod params;
mod tariff;

pub use function::{FunctionFamily, FunctionSpec, LOG_FLOOR};
pub use market::Market;
pub use outcome::{
    Clearing, Elasticities, ForeignWelfare, MarketEquilibrium, MarketSchedule, ScanPoint,
    ScheduleRow, TariffOutcome, WelfareReport, WorldWelfare,
};
pub use params::{Coefficients, ParamError, ParamSource, Params};
pub use tariff::{Tariff, TariffKind};
