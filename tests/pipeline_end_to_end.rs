use slidematch::drag::{DragConfig, DragController};
use slidematch::driver::{Automation, CaptchaImages, ImageSource, Pointer, WaitOptions};
use slidematch::{
    CaptchaVendor, ColorImage, LoopConfig, Outcome, PixelLayout, Rect, ShumeiVendor, SlideResult,
    SliderSolver, SolveConfig, SolveLoop,
};
use std::time::Duration;

/// Piece outline: 24x24 body with a knob on top.
fn in_piece(x: usize, y: usize) -> bool {
    let body = (0..24).contains(&x) && (6..30).contains(&y);
    let knob = (8..16).contains(&x) && (0..6).contains(&y);
    body || knob
}

fn make_challenge(gap_x: usize, gap_y: usize) -> (ColorImage, ColorImage) {
    let (w, h) = (300, 150);
    let mut bg = ColorImage::filled(w, h, PixelLayout::Bgr8, &[0, 0, 0]).unwrap();
    for y in 0..h {
        for x in 0..w {
            let r = 140 + ((x * 3 + y) % 100) as u8;
            let g = 150 + ((x + y * 5) % 90) as u8;
            let b = 160 + ((x * y) % 80) as u8;
            bg.put_rgb(x, y, [r, g, b]);
        }
    }
    let mut piece = ColorImage::filled(40, h, PixelLayout::Rgba8, &[0, 0, 0, 0]).unwrap();
    for y in 0..30 {
        for x in 0..24 {
            if in_piece(x, y) {
                bg.put_rgb(gap_x + x, gap_y + y, [35, 30, 40]);
                piece.put_pixel(4 + x, gap_y + y, &[210, 200, 190, 255]);
            }
        }
    }
    (bg, piece)
}

#[test]
fn solver_recovers_gap_and_scales_distance() {
    let solver = SliderSolver::new(SolveConfig {
        cross_check: false,
        ..SolveConfig::default()
    });
    for gap_x in [60, 151, 247] {
        let (bg, piece) = make_challenge(gap_x, 70);
        let solution = solver.solve(&bg, &piece, 0.5).unwrap();
        assert_eq!(solution.gap.location.x, gap_x as i32);
        assert_eq!(solution.gap.location.y, 70);
        assert_eq!(solution.distance, (gap_x / 2) as i32);
        assert_eq!(solution.primary.total(), i64::from(solution.distance));
        assert_eq!(solution.jitter.total(), 10);
        assert_eq!(solution.piece_bbox.x(), 4);
        assert_eq!(solution.piece_bbox.width(), 24);
    }
}

#[test]
fn gap_at_left_edge_is_rejected() {
    let (bg, piece) = make_challenge(0, 40);
    let err = SliderSolver::default().solve(&bg, &piece, 0.5).unwrap_err();
    assert_eq!(
        err,
        slidematch::SlideError::InvalidInput("scaled gap offset must be positive")
    );
}

struct Browser {
    origin: Rect,
    down: Option<(f64, f64)>,
    released_at: Option<(f64, f64)>,
    cursor: (f64, f64),
    target_x: f64,
}

impl Pointer for Browser {
    fn pointer_move(&mut self, x: f64, y: f64) -> SlideResult<()> {
        self.cursor = (x, y);
        Ok(())
    }
    fn pointer_down(&mut self) -> SlideResult<()> {
        self.down = Some(self.cursor);
        Ok(())
    }
    fn pointer_up(&mut self) -> SlideResult<()> {
        self.released_at = Some(self.cursor);
        Ok(())
    }
}

impl Automation for Browser {
    fn is_connected(&self) -> bool {
        true
    }
    fn navigate(&mut self, _url: &str, _retries: u32) -> bool {
        true
    }
    fn attribute(
        &mut self,
        _selector: &str,
        _name: &str,
        _wait: &WaitOptions,
    ) -> SlideResult<Option<String>> {
        Ok(None)
    }
    fn bounding_box(&mut self, _selector: &str, _wait: &WaitOptions) -> SlideResult<Rect> {
        Ok(self.origin)
    }
    fn is_visible(&mut self, selector: &str) -> bool {
        let dropped_on_target = match (self.down, self.released_at) {
            (Some(down), Some(up)) => (up.0 - down.0 - self.target_x).abs() < 0.5,
            _ => false,
        };
        selector == ShumeiVendor.success_selector() && dropped_on_target
    }
}

struct Static(ColorImage, ColorImage);

impl ImageSource for Static {
    fn fetch(
        &mut self,
        _automation: &mut dyn Automation,
        _vendor: &dyn CaptchaVendor,
        _wait: &WaitOptions,
        _attempt: usize,
    ) -> SlideResult<CaptchaImages> {
        Ok(CaptchaImages {
            background: self.0.clone(),
            piece: self.1.clone(),
        })
    }
}

#[test]
fn solve_loop_drags_handle_onto_gap() {
    let (bg, piece) = make_challenge(180, 50);
    let mut browser = Browser {
        origin: Rect {
            x: 100.0,
            y: 400.0,
            width: 40.0,
            height: 40.0,
        },
        down: None,
        released_at: None,
        cursor: (0.0, 0.0),
        target_x: 90.0,
    };
    let drag = DragController::new(DragConfig {
        pause_min: Duration::ZERO,
        pause_max: Duration::ZERO,
        seed: Some(1),
    })
    .unwrap();
    let cfg = LoopConfig {
        max_attempts: 2,
        retry_delay: Duration::ZERO,
        settle_delay: Duration::ZERO,
        ..LoopConfig::default()
    };
    let mut solve_loop = SolveLoop::new(Box::new(ShumeiVendor), SliderSolver::default(), drag, cfg)
        .unwrap();

    let outcome = solve_loop.run(&mut browser, &mut Static(bg, piece)).unwrap();
    assert_eq!(outcome, Outcome::Solved { attempts: 1 });
    assert_eq!(browser.down, Some((120.0, 420.0)));
    let (up_x, up_y) = browser.released_at.unwrap();
    assert_eq!(up_x, 210.0);
    // The vertical axis keeps repeating its last step (-1) once it runs out:
    // 12 jitter steps sum to 10, then 31 more primary steps at -1 each.
    assert_eq!(up_y, 399.0);
}

#[cfg(feature = "image-io")]
#[test]
fn solves_from_files_and_writes_debug_images() {
    use slidematch::image::io::save_color;
    use slidematch::locate::ANNOTATED_FILE;
    use slidematch::solve::PIECE_CROPPED_FILE;

    let dir = std::env::temp_dir().join(format!("slidematch-e2e-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let (bg, piece) = make_challenge(120, 60);
    save_color(dir.join("bg.png"), &bg).unwrap();
    save_color(dir.join("piece.png"), &piece).unwrap();

    let solver = SliderSolver::new(SolveConfig {
        debug_dir: Some(dir.clone()),
        ..SolveConfig::default()
    });
    let solution = solver
        .solve_files(dir.join("bg.png"), dir.join("piece.png"), 0.5)
        .unwrap();
    assert_eq!(solution.gap.location.x, 120);
    assert_eq!(solution.distance, 60);
    assert!(dir.join(ANNOTATED_FILE).exists());
    assert!(dir.join(PIECE_CROPPED_FILE).exists());

    std::fs::remove_dir_all(&dir).ok();
}
