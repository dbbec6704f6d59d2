//! Synthetic atmospheric reference data.
//!
//! [`generate_atmos`] writes `atmosds.nc`, a small daily surface dataset for a
//! handful of Canadian cities. The data is drawn from a fixed seed and the
//! derived variables are computed from the drawn ones, so every run produces
//! the same values. [`test_timeseries`] builds the in-memory series handed to
//! documentation examples.

use crate::error::Result;
use crate::util;
use ndarray::{Array1, Array2, Zip};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;
use std::path::{Path, PathBuf};

/// File name of the synthetic atmospheric dataset.
pub const ATMOS_FILE: &str = "atmosds.nc";

const ATMOS_SEED: u64 = 1990;
/// 1990-01-01 through 1993-12-31.
const N_DAYS: usize = 1461;
const TIME_UNITS: &str = "days since 1990-01-01 00:00:00";
const FREEZING_K: f64 = 273.15;
const CALM_WIND: f64 = 0.5;

/// A station in the synthetic dataset.
#[derive(Debug, Clone, Copy)]
struct City {
    name: &'static str,
    lat: f64,
    lon: f64,
    /// Annual mean temperature, °C.
    mean_c: f64,
    /// Half the seasonal temperature range, °C.
    amplitude_c: f64,
    /// Probability of a wet day.
    wet_prob: f64,
}

const CITIES: [City; 5] = [
    City { name: "Halifax", lat: 44.65, lon: -63.57, mean_c: 7.5, amplitude_c: 11.0, wet_prob: 0.45 },
    City { name: "Montréal", lat: 45.50, lon: -73.57, mean_c: 6.8, amplitude_c: 15.5, wet_prob: 0.40 },
    City { name: "Iqaluit", lat: 63.75, lon: -68.52, mean_c: -9.3, amplitude_c: 17.5, wet_prob: 0.30 },
    City { name: "Saskatoon", lat: 52.13, lon: -106.67, mean_c: 3.3, amplitude_c: 18.5, wet_prob: 0.25 },
    City { name: "Victoria", lat: 48.43, lon: -123.37, mean_c: 10.0, amplitude_c: 6.0, wet_prob: 0.40 },
];

/// CF metadata of a generated variable.
#[derive(Debug, Clone, Copy)]
struct VarSpec {
    name: &'static str,
    standard_name: &'static str,
    long_name: &'static str,
    units: &'static str,
}

const fn spec(
    name: &'static str,
    standard_name: &'static str,
    long_name: &'static str,
    units: &'static str,
) -> VarSpec {
    VarSpec { name, standard_name, long_name, units }
}

/// Daily fields of the synthetic dataset, shaped `(time, location)`.
#[derive(Debug)]
struct AtmosFields {
    fields: Vec<(VarSpec, Array2<f64>)>,
}

impl AtmosFields {
    fn synthesize(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let shape = (N_DAYS, CITIES.len());

        let mut tas = Array2::<f64>::zeros(shape);
        let mut dtr = Array2::<f64>::zeros(shape);
        let mut pr = Array2::<f64>::zeros(shape);
        let mut uas = Array2::<f64>::zeros(shape);
        let mut vas = Array2::<f64>::zeros(shape);
        let mut ps = Array2::<f64>::zeros(shape);

        for t in 0..N_DAYS {
            // Coldest around mid-January
            let season = -(2.0 * PI * (t as f64 - 15.0) / 365.25).cos();
            for (j, city) in CITIES.iter().enumerate() {
                let anomaly = (rng.gen::<f64>() + rng.gen::<f64>() + rng.gen::<f64>() - 1.5) * 4.0;
                tas[[t, j]] = FREEZING_K + city.mean_c + city.amplitude_c * season + anomaly;
                dtr[[t, j]] = 6.0 + 6.0 * rng.gen::<f64>();

                let wet = rng.gen::<f64>() < city.wet_prob;
                let depth: f64 = rng.gen_range(1e-6..1.0);
                pr[[t, j]] = if wet { -depth.ln() * 4.0 / 86400.0 } else { 0.0 };

                uas[[t, j]] = rng.gen_range(-8.0_f64..8.0);
                vas[[t, j]] = rng.gen_range(-8.0_f64..8.0);
                ps[[t, j]] = 101_325.0 + rng.gen_range(-2_500.0_f64..2_500.0);
            }
        }

        let tasmax = &tas + &(&dtr / 2.0);
        let tasmin = &tas - &(&dtr / 2.0);
        // Recomputed so that tas is exactly the mean of the extremes
        let tas = (&tasmax + &tasmin) / 2.0;

        let mut prsn = Array2::<f64>::zeros(shape);
        Zip::from(&mut prsn)
            .and(&pr)
            .and(&tas)
            .for_each(|s, &p, &t| *s = if t < FREEZING_K { p } else { 0.0 });

        let mut sfc_wind = Array2::<f64>::zeros(shape);
        let mut wind_dir = Array2::<f64>::zeros(shape);
        Zip::from(&mut sfc_wind)
            .and(&mut wind_dir)
            .and(&uas)
            .and(&vas)
            .for_each(|w, d, &u, &v| {
                let (speed, from_dir) = wind_speed_from_vector(u, v);
                *w = speed;
                *d = from_dir;
            });

        let huss = tas.mapv(specific_humidity);

        Self {
            fields: vec![
                (spec("tas", "air_temperature", "Mean daily surface temperature", "K"), tas),
                (spec("tasmin", "air_temperature", "Minimum daily surface temperature", "K"), tasmin),
                (spec("tasmax", "air_temperature", "Maximum daily surface temperature", "K"), tasmax),
                (spec("pr", "precipitation_flux", "Mean daily precipitation flux", "kg m-2 s-1"), pr),
                (spec("prsn", "snowfall_flux", "Mean daily snowfall flux", "kg m-2 s-1"), prsn),
                (spec("uas", "eastward_wind", "Eastward near-surface wind", "m s-1"), uas),
                (spec("vas", "northward_wind", "Northward near-surface wind", "m s-1"), vas),
                (spec("sfcWind", "wind_speed", "Near-surface wind speed", "m s-1"), sfc_wind),
                (
                    spec("sfcWindfromdir", "wind_from_direction", "Near-surface wind from direction", "degree"),
                    wind_dir,
                ),
                (spec("huss", "specific_humidity", "Near-surface specific humidity", "1"), huss),
                (spec("ps", "surface_air_pressure", "Surface air pressure", "Pa"), ps),
            ],
        }
    }

    fn write(&self, path: &Path) -> Result<()> {
        let mut file = netcdf::create(path)?;

        let locations: Vec<&str> = CITIES.iter().map(|c| c.name).collect();
        file.add_attribute("title", "Synthetic daily surface data for Canadian cities")?;
        file.add_attribute("Conventions", "CF-1.8")?;
        file.add_attribute("source", "xclim-testing synthetic generator")?;
        file.add_attribute("locations", locations.join(", ").as_str())?;

        file.add_dimension("time", N_DAYS)?;
        file.add_dimension("location", CITIES.len())?;

        let time: Vec<f64> = (0..N_DAYS).map(|t| t as f64).collect();
        {
            let mut var = file.add_variable::<f64>("time", &["time"])?;
            var.put_attribute("standard_name", "time")?;
            var.put_attribute("units", TIME_UNITS)?;
            var.put_attribute("calendar", "standard")?;
            var.put_values(&time, ..)?;
        }

        let coords = [
            ("lat", "latitude", "degrees_north", CITIES.map(|c| c.lat)),
            ("lon", "longitude", "degrees_east", CITIES.map(|c| c.lon)),
        ];
        for (name, standard_name, units, values) in &coords {
            let mut var = file.add_variable::<f64>(name, &["location"])?;
            var.put_attribute("standard_name", *standard_name)?;
            var.put_attribute("units", *units)?;
            var.put_values(&values[..], ..)?;
        }

        for (spec, data) in &self.fields {
            let values: Vec<f32> = data.iter().map(|&v| v as f32).collect();
            let mut var = file.add_variable::<f32>(spec.name, &["time", "location"])?;
            var.put_attribute("standard_name", spec.standard_name)?;
            var.put_attribute("long_name", spec.long_name)?;
            var.put_attribute("units", spec.units)?;
            var.put_attribute("coordinates", "lat lon")?;
            var.put_values(&values, ..)?;
        }

        Ok(())
    }
}

/// Wind speed and meteorological "from" direction of a wind vector.
///
/// Calm winds get a direction of 0 and northerlies 360.
fn wind_speed_from_vector(uas: f64, vas: f64) -> (f64, f64) {
    let speed = uas.hypot(vas);
    if speed < CALM_WIND {
        return (speed, 0.0);
    }
    let dir = (270.0 - vas.atan2(uas).to_degrees()).rem_euclid(360.0);
    (speed, if dir == 0.0 { 360.0 } else { dir })
}

/// Specific humidity at 80% relative humidity and standard pressure.
fn specific_humidity(tas: f64) -> f64 {
    let t_c = tas - FREEZING_K;
    // Tetens saturation vapour pressure, Pa
    let e_sat = 610.78 * (17.27 * t_c / (t_c + 237.3)).exp();
    let e = 0.8 * e_sat;
    0.622 * e / (101_325.0 - 0.378 * e)
}

/// Write the synthetic atmospheric dataset into `dir`.
///
/// The file is built next to its final location and renamed into place, so
/// calling this repeatedly leaves exactly one complete `atmosds.nc` with the
/// same content.
pub fn generate_atmos(dir: &Path) -> Result<PathBuf> {
    let target = dir.join(ATMOS_FILE);
    let fields = AtmosFields::synthesize(ATMOS_SEED);
    util::replace_with(&target, |tmp| fields.write(tmp))?;
    tracing::info!("Generated synthetic atmospheric dataset at {}", target.display());
    Ok(target)
}

/// A daily series handed to documentation examples.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    /// Variable name (`tas`, `pr`, ...).
    pub variable: String,
    /// CF standard name.
    pub standard_name: String,
    /// Units of `values`.
    pub units: String,
    /// ISO date of the first value.
    pub start: String,
    /// Daily values.
    pub values: Array1<f64>,
}

impl TimeSeries {
    /// Number of days in the series.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the series has no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Wrap `values` as a daily series of `variable` starting at `start`.
///
/// Unknown variables get empty metadata.
pub fn test_timeseries(values: Array1<f64>, variable: &str, start: &str) -> TimeSeries {
    let (standard_name, units) = match variable {
        "tas" | "tasmin" | "tasmax" => ("air_temperature", "K"),
        "pr" => ("precipitation_flux", "mm/d"),
        "prsn" => ("snowfall_flux", "mm/d"),
        "sfcWind" => ("wind_speed", "m s-1"),
        _ => ("", ""),
    };

    TimeSeries {
        variable: variable.to_string(),
        standard_name: standard_name.to_string(),
        units: units.to_string(),
        start: start.to_string(),
        values,
    }
}

/// One year of seeded uniform noise, `offset + scale * U(0, 1)`.
pub fn seeded_year(seed: u64, scale: f64, offset: f64) -> Array1<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    Array1::from_shape_fn(365, |_| offset + scale * rng.gen::<f64>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::read_variable;

    #[test]
    fn test_wind_direction_conventions() {
        // Wind blowing toward the east comes from the west
        let (speed, dir) = wind_speed_from_vector(5.0, 0.0);
        assert!((speed - 5.0).abs() < 1e-12);
        assert!((dir - 270.0).abs() < 1e-9);

        // Blowing toward the south comes from the north
        let (_, dir) = wind_speed_from_vector(0.0, -5.0);
        assert_eq!(dir, 360.0);

        let (_, dir) = wind_speed_from_vector(0.1, 0.1);
        assert_eq!(dir, 0.0);
    }

    #[test]
    fn test_synthesize_is_deterministic() {
        let a = AtmosFields::synthesize(7);
        let b = AtmosFields::synthesize(7);
        for ((sa, da), (sb, db)) in a.fields.iter().zip(&b.fields) {
            assert_eq!(sa.name, sb.name);
            assert_eq!(da, db);
        }
    }

    #[test]
    fn test_derived_fields_are_consistent() {
        let fields = AtmosFields::synthesize(ATMOS_SEED);
        let get = |name: &str| &fields.fields.iter().find(|(s, _)| s.name == name).unwrap().1;

        let (tas, tasmin, tasmax) = (get("tas"), get("tasmin"), get("tasmax"));
        Zip::from(tas).and(tasmin).and(tasmax).for_each(|&t, &n, &x| {
            assert!(n < t && t < x);
        });

        Zip::from(get("prsn")).and(get("pr")).and(tas).for_each(|&s, &p, &t| {
            assert!(p >= 0.0);
            assert_eq!(s, if t < FREEZING_K { p } else { 0.0 });
        });

        assert!(get("sfcWindfromdir").iter().all(|&d| (0.0..=360.0).contains(&d)));
    }

    #[test]
    fn test_generate_twice_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let first = generate_atmos(dir.path()).unwrap();
        let tas_first = read_variable(&first, "tas").unwrap();

        let second = generate_atmos(dir.path()).unwrap();
        let tas_second = read_variable(&second, "tas").unwrap();

        assert_eq!(first, second);
        assert_eq!(tas_first.shape, vec![N_DAYS, CITIES.len()]);
        assert_eq!(tas_first.data, tas_second.data);

        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().flatten().collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].file_name(), ATMOS_FILE);
    }

    #[test]
    fn test_timeseries_metadata() {
        let ts = test_timeseries(seeded_year(1, 20.0, 253.15), "tas", "2000-01-01");
        assert_eq!(ts.len(), 365);
        assert_eq!(ts.units, "K");
        assert!(ts.values.iter().all(|&v| (253.15..273.15).contains(&v)));

        let other = test_timeseries(Array1::zeros(3), "zz", "2000-01-01");
        assert!(other.units.is_empty());
    }
}
