use cgmath::{Deg, Quaternion, Rotation3, Vector3};
use flow_orbit::{
    config::Config,
    data_structures::{instance::Instance, model::Model},
    flow,
    render::{DrawMode, Scene},
    resources::mesh::sin_x_cos_y,
};

const RED: [f32; 4] = [1.0, 0.0, 0.0, 1.0];
const GREEN: [f32; 4] = [0.0, 1.0, 0.0, 1.0];
const BLUE: [f32; 4] = [0.0, 0.0, 1.0, 1.0];
const MAGENTA: [f32; 4] = [1.0, 0.0, 1.0, 1.0];

fn main() -> anyhow::Result<()> {
    flow::run(Config::default(), |ctx| {
        let torus = ctx.load_model("blender_assets/torus.obj");
        let dodecahedron = ctx.load_model("blender_assets/dodecahedron.obj");
        let plane = ctx.load_model("blender_assets/plane.obj");
        let surface = Model::from_meshes(vec![sin_x_cos_y()?]);

        let mut scene = Scene::new();
        scene.push(ctx.place(
            "torus",
            &torus,
            Instance::at(Vector3::new(1.5, 0.3, 0.0)).with_color(RED),
            DrawMode::Filled,
        ));
        scene.push(ctx.place(
            "dodecahedron",
            &dodecahedron,
            Instance::at(Vector3::new(-1.5, 0.7, 0.0)).with_color(GREEN),
            DrawMode::Wireframe,
        ));
        scene.push(ctx.place(
            "plane",
            &plane,
            Instance::new().with_uniform_scale(5.0).with_color(BLUE),
            DrawMode::Filled,
        ));
        scene.push(ctx.place(
            "surface",
            &surface,
            Instance::at(Vector3::new(0.0, 3.0, 0.0))
                .with_rotation(Quaternion::from_angle_x(Deg(90.0)))
                .with_color(MAGENTA),
            DrawMode::Wireframe,
        ));
        Ok(scene)
    })
}
