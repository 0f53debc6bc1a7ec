use ctpa_viewer::{
    Direction, Plane, ViewState, Volume, WindowPreset, WindowSetting, session::Session,
    window::apply_window_u8,
};
use ndarray::Array3;

/// Volume whose samples rise by 10 HU per axial slice, starting at -1500.
fn ramp_volume(dims: (usize, usize, usize)) -> Volume {
    let data = Array3::from_shape_fn(dims, |(_, _, z)| -1500.0 + 10.0 * z as f32);
    Volume::new(data, (0.8, 0.8, 1.0))
}

#[test]
fn navigating_a_volume_renders_every_plane_in_bounds() {
    let volume = ramp_volume((40, 30, 20));
    let dims = volume.dim();
    let mut view = ViewState::new(dims).unwrap();

    for plane in Plane::ALL {
        view = view.switch_plane(plane, dims);
        for _ in 0..100 {
            view = view.navigate(Direction::Next, dims);
            assert!(view.current_slice() < plane.extent(dims));
        }
        let image = volume
            .get_image_from_axis(view.current_slice(), plane, view.window())
            .unwrap();
        let slice = volume
            .get_slice_from_axis(view.current_slice(), plane)
            .unwrap();
        assert_eq!(
            (image.height() as usize, image.width() as usize),
            slice.dim()
        );
    }
}

#[test]
fn axial_slices_brighten_monotonically_under_a_window() {
    let volume = ramp_volume((8, 8, 200));
    let window = WindowSetting::from_preset(WindowPreset::Pulmonary);

    let mut previous = 0u8;
    for z in 0..200 {
        let slice = volume.get_slice_from_axis(z, Plane::Axial).unwrap();
        let windowed = apply_window_u8(&slice, window);
        let value = windowed[[0, 0]];
        assert!(value >= previous);
        previous = value;
    }
    // -1500 + 10 * 199 = 490 HU, above the pulmonary window
    assert_eq!(previous, 255);
}

#[test]
fn session_keeps_view_across_plane_round_trip() {
    let mut session = Session::new();
    session.select_scan("scan-1", (512, 512, 300)).unwrap();
    assert_eq!(session.view().unwrap().current_slice(), 150);

    session.update_view(|view, dims| view.navigate(Direction::Previous, dims));
    session.update_view(|view, dims| view.switch_plane(Plane::Sagittal, dims));
    session.update_view(|view, dims| view.navigate(Direction::Next, dims));
    let view = session
        .update_view(|view, dims| view.switch_plane(Plane::Axial, dims))
        .unwrap();

    assert_eq!(view.current_slice(), 149);
    assert_eq!(view.remembered(Plane::Sagittal), Some(257));
    assert_eq!(
        view.apply_preset(WindowPreset::PEProtocol).window().bounds(),
        (-250, 450)
    );
}
