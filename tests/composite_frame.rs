use std::time::{Duration, Instant};

use studiocast::{
    Bitmap, ElementId, Rect, Rgba8, Scene, Studio, StudioResult, VisualConfig,
    camera::{CameraFrame, ReadyState},
    slide::PageRasterizer,
};

struct SolidDeck(Vec<[u8; 4]>);

impl PageRasterizer for SolidDeck {
    fn page_count(&self) -> u32 {
        self.0.len() as u32
    }

    fn rasterize(&self, page: u32) -> StudioResult<Bitmap> {
        Ok(Bitmap::filled(16, 9, self.0[(page - 1) as usize]))
    }
}

fn pixel(frame: &Bitmap, x: u32, y: u32) -> [u8; 4] {
    let i = ((y * frame.width + x) * 4) as usize;
    [
        frame.data[i],
        frame.data[i + 1],
        frame.data[i + 2],
        frame.data[i + 3],
    ]
}

fn flat_studio() -> Studio {
    let mut studio = Studio::new();
    studio.config.shadow_intensity = 0;
    studio
}

#[test]
fn default_frame_is_canvas_sized_and_opaque() {
    let mut studio = flat_studio();
    let frame = studio.tick(Instant::now(), None).unwrap();
    assert_eq!((frame.width, frame.height), (1920, 1080));
    assert!(frame.data.chunks_exact(4).all(|px| px[3] == 255));
}

#[test]
fn slide_page_fills_the_slide_region() {
    let mut studio = flat_studio();
    studio.config.crossfade_ms = 0;
    studio.load_deck(Box::new(SolidDeck(vec![[255, 0, 0, 255]])));

    let frame = studio.tick(Instant::now(), None).unwrap();
    // Center of the default slide rect {80, 150, 1200, 675}.
    assert_eq!(pixel(&frame, 680, 487), [255, 0, 0, 255]);
    // Background outside any element.
    assert_eq!(pixel(&frame, 5, 5), Rgba8::opaque(0xfd, 0xf5, 0xf2).to_premul());
}

#[test]
fn crossfade_settles_on_the_incoming_page() {
    let mut studio = flat_studio();
    studio.load_deck(Box::new(SolidDeck(vec![
        [255, 0, 0, 255],
        [0, 0, 255, 255],
    ])));

    let t0 = Instant::now();
    studio.tick(t0, None).unwrap();
    studio.set_page(2);

    // Mid-fade the channel mix is strictly between the two pages.
    let mid = studio.tick(t0 + Duration::from_millis(400), None).unwrap();
    let px = pixel(&mid, 680, 487);
    assert!(px[0] > 0 && px[2] > 0, "expected a blend, got {px:?}");

    // Past the duration only the incoming page remains.
    let done = studio.tick(t0 + Duration::from_secs(2), None).unwrap();
    let after = studio.tick(t0 + Duration::from_secs(3), None).unwrap();
    assert_eq!(pixel(&done, 680, 487), pixel(&after, 680, 487));
    assert_eq!(pixel(&after, 680, 487), [0, 0, 255, 255]);
}

#[test]
fn ready_camera_replaces_the_placeholder() {
    let mut studio = flat_studio();
    let camera = CameraFrame {
        bitmap: Bitmap::filled(640, 480, [0, 128, 0, 255]),
        ready_state: ReadyState::EnoughData,
    };

    let with_cam = studio.tick(Instant::now(), Some(&camera)).unwrap();
    // Center of the default camera rect {1350, 300, 450, 450}.
    assert_eq!(pixel(&with_cam, 1575, 525), [0, 128, 0, 255]);

    let not_ready = CameraFrame {
        ready_state: ReadyState::Metadata,
        ..camera
    };
    let without = studio.tick(Instant::now(), Some(&not_ready)).unwrap();
    assert_eq!(pixel(&without, 1575, 525), [255, 255, 255, 255]);
}

#[test]
fn moved_element_is_drawn_at_its_new_rect() {
    let mut studio = flat_studio();
    studio
        .scene
        .set_rect(ElementId::Camera, Rect::new(200.6, 850.9, 450.0, 200.0));
    let frame = studio.tick(Instant::now(), None).unwrap();
    // Placeholder fill at the new center, background where the camera was.
    assert_eq!(pixel(&frame, 425, 950), [255, 255, 255, 255]);
    assert_eq!(
        pixel(&frame, 1575, 525),
        Rgba8::opaque(0xfd, 0xf5, 0xf2).to_premul()
    );
}

#[test]
fn lower_third_band_appears_with_subtitle_only() {
    let mut studio = flat_studio();
    studio.config.subtitle = "Live from the studio".to_string();
    let frame = studio.tick(Instant::now(), None).unwrap();
    assert_eq!(
        pixel(&frame, 0, 1079),
        studio.config.bar_color_start.to_premul()
    );
    assert_eq!(
        pixel(&frame, 1919, 1079),
        studio.config.bar_color_end.to_premul()
    );
}

#[test]
fn scene_json_round_trips_through_the_cli_shape() {
    let scene = Scene::default();
    let config = VisualConfig::default();
    let json = serde_json::json!({ "scene": scene, "config": config }).to_string();

    #[derive(serde::Deserialize)]
    struct SceneFile {
        scene: Scene,
        config: VisualConfig,
    }
    let parsed: SceneFile = serde_json::from_str(&json).unwrap();
    assert_eq!(
        parsed.scene.element(ElementId::Slide).rect,
        scene.element(ElementId::Slide).rect
    );
    assert_eq!(parsed.config.crossfade_ms, config.crossfade_ms);
}
