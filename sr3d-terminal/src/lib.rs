/// Terminal host for the SR3D software rasterizer
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent},
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self},
};
use nalgebra::{Matrix4, Point3, UnitQuaternion, Vector3, Vector4};
use sr3d_core::{FrameBuffer, Node, Renderer, Traverser};
use std::io::{self, stdout, Write};
use std::time::{Duration, Instant};

pub mod present;

const CLEAR_COLOR: u32 = 0x101018FF;

/// Rotation state around three axes (in radians)
#[derive(Debug, Clone, Copy, Default)]
pub struct RotationState {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl RotationState {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Rotate by delta amounts (in radians)
    pub fn rotate(&mut self, dx: f32, dy: f32, dz: f32) {
        self.x += dx;
        self.y += dy;
        self.z += dz;
    }

    pub fn quaternion(&self) -> UnitQuaternion<f32> {
        UnitQuaternion::from_euler_angles(self.x, self.y, self.z)
    }
}

/// Main application struct for terminal 3D rendering: owns the scene root,
/// drives the per-frame clear/traverse/present contract and maps keyboard
/// input onto the root node's rotation.
pub struct TerminalApp {
    root: Node,
    rotation: RotationState,
    renderer: Renderer,
    traverser: Traverser,
    camera_target: Vector3<f32>,
    camera_distance: f32,
    running: bool,
    last_frame: Instant,
    frame_count: u32,
    fps: f32,
}

impl TerminalApp {
    pub fn new(root: Node) -> io::Result<Self> {
        let (width, height) = terminal::size()?;
        let renderer = Renderer::new(FrameBuffer::new(width as usize, height as usize), CLEAR_COLOR);

        // frame the scene from its bounds when it has any
        let (camera_target, camera_distance) = match root.bounds.as_ref().filter(|b| !b.is_empty()) {
            Some(bounds) => (bounds.center(), ((bounds.max - bounds.min).norm() * 1.5).max(2.0)),
            None => (Vector3::zeros(), 4.0),
        };

        Ok(Self {
            root,
            rotation: RotationState::new(0.3, 0.3, 0.0),
            renderer,
            traverser: Traverser::new(),
            camera_target,
            camera_distance,
            running: true,
            last_frame: Instant::now(),
            frame_count: 0,
            fps: 0.0,
        })
    }

    pub fn run(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;

        let result = self.main_loop();

        // Cleanup
        terminal::disable_raw_mode()?;
        execute!(stdout(), terminal::LeaveAlternateScreen, cursor::Show)?;

        result
    }

    fn main_loop(&mut self) -> io::Result<()> {
        let target_frame_time = Duration::from_millis(1000 / 30); // 30 FPS target

        while self.running {
            let frame_start = Instant::now();

            if event::poll(Duration::from_millis(0))? {
                self.handle_input()?;
            }

            self.update();
            self.render()?;

            let elapsed = frame_start.elapsed();
            if elapsed < target_frame_time {
                std::thread::sleep(target_frame_time - elapsed);
            }

            // FPS counter
            self.frame_count += 1;
            let now = Instant::now();
            if (now - self.last_frame).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_frame).as_secs_f32();
                self.frame_count = 0;
                self.last_frame = now;
            }
        }

        Ok(())
    }

    fn handle_input(&mut self) -> io::Result<()> {
        if let Event::Key(KeyEvent { code, .. }) = event::read()? {
            match code {
                KeyCode::Char('q') | KeyCode::Esc => {
                    self.running = false;
                }
                KeyCode::Char('w') | KeyCode::Up => {
                    self.rotation.rotate(0.1, 0.0, 0.0);
                }
                KeyCode::Char('s') | KeyCode::Down => {
                    self.rotation.rotate(-0.1, 0.0, 0.0);
                }
                KeyCode::Char('a') | KeyCode::Left => {
                    self.rotation.rotate(0.0, -0.1, 0.0);
                }
                KeyCode::Char('d') | KeyCode::Right => {
                    self.rotation.rotate(0.0, 0.1, 0.0);
                }
                KeyCode::Char('e') => {
                    self.rotation.rotate(0.0, 0.0, 0.1);
                }
                KeyCode::Char('r') => {
                    self.rotation.rotate(0.0, 0.0, -0.1);
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn update(&mut self) {
        // Continuous slow rotation for demo effect
        self.rotation.rotate(0.01, 0.015, 0.0);
        self.root.rotation = self.rotation.quaternion();
    }

    fn render(&mut self) -> io::Result<()> {
        // camera above and behind the target, looking at it
        let eye = Point3::from(
            self.camera_target
                + Vector3::new(0.0, self.camera_distance * 0.35, self.camera_distance),
        );
        let view = Matrix4::look_at_rh(&eye, &Point3::from(self.camera_target), &Vector3::y());
        *self.renderer.matrix_stack.current_matrix_mut() = view;

        // light direction is consumed in view space
        self.renderer.light_dir = (view * Vector4::new(1.0, 1.0, 1.0, 0.0)).xyz().normalize();

        self.renderer.clear();
        self.traverser.traverse(&self.root, &mut self.renderer);

        let mut stdout = stdout();
        queue!(stdout, cursor::MoveTo(0, 0))?;
        present::present(&self.renderer.frame_buffer, &mut stdout)?;

        // UI overlay
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            SetForegroundColor(Color::Yellow),
            Print(format!(
                "SR3D Terminal Renderer | FPS: {:.1} | Controls: WASD/Arrows=Rotate E/R=Roll Q=Quit",
                self.fps
            )),
            ResetColor
        )?;

        stdout.flush()?;
        Ok(())
    }
}
