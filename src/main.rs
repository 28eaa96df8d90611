use ndarray::{Array1, Array2};
use spectral_corr::{
    BaselineRegion, ConvertibleAxis, Corr2dConfig, Corr2dEngine, Spectra, UnitCategory,
    VariableAxis,
};
use std::error::Error;

/// Gaussian band whose center drifts and whose height drops with temperature,
/// on top of a sloped background.
fn synthetic_spectra() -> spectral_corr::Result<Spectra> {
    let wavelengths = Array1::<f64>::linspace(400.0, 700.0, 301);
    let temperatures = Array1::<f64>::linspace(20.0, 80.0, 13);
    let data = Array2::from_shape_fn((wavelengths.len(), temperatures.len()), |(i, j)| {
        let x = wavelengths[i];
        let t = temperatures[j];
        let center = 520.0 + 0.4 * (t - 20.0);
        let height = 1000.0 - 6.0 * (t - 20.0);
        let band = height * (-((x - center) / 18.0).powi(2)).exp();
        2000.0 + 0.5 * (x - 400.0) - band
    });
    let index = ConvertibleAxis::spectral(wavelengths, "nm")?;
    let columns = VariableAxis::Convertible(ConvertibleAxis::with_unit(
        temperatures,
        UnitCategory::Temperature,
        "c",
    )?);
    Ok(Spectra::new(data, index, columns)?.with_name("synthetic temperature series"))
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    log::info!("Starting spectral-corr v{}", env!("CARGO_PKG_VERSION"));

    let raw = synthetic_spectra()?;
    let (rows, columns) = raw.shape();
    log::info!("{} spectra of {} points in {}", columns, rows, raw.index().title());

    let reference = raw.column(0).ok_or("no spectra")?.to_owned();
    let absorbance = raw
        .as_iunit_with_baseline(Some("a"), Some(reference.view()))?
        .as_specunit(Some("cm-1"))?
        .as_varunit("k")?;
    log::info!(
        "intensity: {}, index: {}",
        absorbance.iunit_title(),
        absorbance.index().title()
    );

    let regions = [
        BaselineRegion::Range(25_000.0, 23_000.0),
        BaselineRegion::Range(15_500.0, 14_000.0),
    ];
    let flattened = absorbance.subtract_fitted_baseline(&regions)?;

    let mut engine = Corr2dEngine::new(Corr2dConfig::centered().with_scaling(0.8, 0.0));
    let mean = spectral_corr::math_tools::row_mean(&flattened.data().view());
    let result = flattened.corr2d(&mut engine, mean.view())?;

    let sync = result.sync_scaled();
    let asynchronous = result.async_scaled();
    let (i, j) = peak_position(&asynchronous);
    let axis = flattened.index().values();
    log::info!(
        "largest synchronous value {:.4e}, asynchronous cross peak {:.4e} at ({:.1}, {:.1}) cm-1",
        sync.iter().cloned().fold(f64::NAN, f64::max),
        asynchronous[[i, j]],
        axis[i],
        axis[j]
    );
    log::info!(
        "phase at that cross peak: {:.3} rad",
        result.phase()[[i, j]]
    );
    Ok(())
}

/// Position of the largest finite absolute value.
fn peak_position(matrix: &Array2<f64>) -> (usize, usize) {
    matrix
        .indexed_iter()
        .filter(|(_, v)| v.is_finite())
        .max_by(|(_, a), (_, b)| a.abs().total_cmp(&b.abs()))
        .map(|(position, _)| position)
        .unwrap_or((0, 0))
}
