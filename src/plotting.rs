use crate::consistency::bounds::AcceptanceInterval;
use gnuplot::*;

/// NEES per step against the constant acceptance bounds. Call `show()` on
/// the returned figure to display it.
pub fn plot_nees(nees: &[f64], bounds: &AcceptanceInterval) -> Figure {
    let k: Vec<f64> = (0..nees.len()).map(|k| k as f64).collect();
    let mut fg = Figure::new();
    let ax = fg.axes2d();
    ax.set_title(
        &format!("NEES, {:.0}% acceptance interval", bounds.confidence * 100.0),
        &[],
    )
    .set_x_label("step", &[])
    .set_y_label("NEES", &[])
    .lines(k.iter().copied(), nees.iter().copied(), &[Caption("NEES")])
    .lines(
        k.iter().copied(),
        k.iter().map(|_| bounds.lower),
        &[Caption("lower bound")],
    )
    .lines(
        k.iter().copied(),
        k.iter().map(|_| bounds.upper),
        &[Caption("upper bound")],
    )
    .set_x_grid(true)
    .set_y_grid(true);
    fg
}
