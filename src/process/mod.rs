// src/process/mod.rs
pub mod cases;
pub mod cumulative;
pub mod dates;
pub mod population;

/// Join key shared by both datasets: 2-digit state code + 3-digit county code.
pub const REGION_KEY: &str = "fips";

/// Final artifact layout, as (source column, output column).
pub const OUTPUT_COLUMNS: [(&str, &str); 9] = [
    (cases::DATE, cases::DATE),
    (cases::COUNTY, cases::COUNTY),
    (cases::STATE, cases::STATE),
    (REGION_KEY, REGION_KEY),
    (cases::CASES, cases::CASES),
    (cases::DEATHS, cases::DEATHS),
    (cumulative::CUMULATIVE_CASES, cumulative::CUMULATIVE_CASES),
    (cumulative::CUMULATIVE_DEATHS, cumulative::CUMULATIVE_DEATHS),
    (population::POPULATION, population::POPULATION),
];
