mod money;

pub use money::{Money, MoneyConversionError, CURRENCY_CODE, CURRENCY_CODE_LOWER};
