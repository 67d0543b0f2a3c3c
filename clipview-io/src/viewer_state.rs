//! Persistable viewer state
//!
//! `ViewerState` captures everything needed to restore a view: the camera,
//! every clipping plane (pose, active flag, bound-group membership) and the
//! renderer display options. It converts to and from an [`Element`] tree and
//! to and from the JSON string stored in viewer-state slots; both forms carry
//! exactly the same fields.

use clipview_core::{
    DisplayOptions, Error, GridAxes, Pose, Real, Result, TimeDisplay, NUM_CLIP_PLANES,
};
use nalgebra::{Point3, Quaternion, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::element::{within, Element};

/// Root element name used for the exported state
pub const VIEWER_STATE_ELEMENT: &str = "viewer_state";

/// Quaternions further than this from unit norm are rejected on load
const UNIT_NORM_TOLERANCE: Real = 1e-6;

/// Shortest view direction and up vector a loaded camera may have, and the
/// smallest sine of the angle between them
const CAMERA_BASIS_TOLERANCE: Real = 1e-9;

/// Persisted camera parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraState {
    pub position: Point3<Real>,
    pub target: Point3<Real>,
    pub up: Vector3<Real>,
    pub fov: Real,
    pub near: Real,
    pub far: Real,
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            position: Point3::new(0.0, 0.0, 5.0),
            target: Point3::origin(),
            up: Vector3::y(),
            fov: std::f64::consts::FRAC_PI_4,
            near: 0.1,
            far: 100.0,
        }
    }
}

/// Persisted clipping-plane parameters
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PlaneState {
    pub pose: Pose,
    pub active: bool,
    /// Member of the bound group
    pub bound: bool,
}

/// Full viewer and renderer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewerState {
    pub camera: CameraState,
    /// Exactly `NUM_CLIP_PLANES` entries, in plane index order
    pub planes: Vec<PlaneState>,
    pub display: DisplayOptions,
}

impl Default for ViewerState {
    fn default() -> Self {
        Self {
            camera: CameraState::default(),
            planes: vec![PlaneState::default(); NUM_CLIP_PLANES],
            display: DisplayOptions::default(),
        }
    }
}

fn point_element(name: &str, p: &Point3<Real>) -> Element {
    Element::new(name)
        .with_field("x", p.x)
        .with_field("y", p.y)
        .with_field("z", p.z)
}

fn vector_element(name: &str, v: &Vector3<Real>) -> Element {
    point_element(name, &Point3::from(*v))
}

fn read_vector(parent: &Element, name: &str) -> Result<Vector3<Real>> {
    let element = parent.require_child(name)?;
    let read = || -> Result<Vector3<Real>> {
        Ok(Vector3::new(element.real("x")?, element.real("y")?, element.real("z")?))
    };
    read().map_err(|e| within(&parent.name, e))
}

fn read_point(parent: &Element, name: &str) -> Result<Point3<Real>> {
    read_vector(parent, name).map(Point3::from)
}

fn orientation_element(q: &UnitQuaternion<Real>) -> Element {
    Element::new("orientation")
        .with_field("w", q.w)
        .with_field("x", q.i)
        .with_field("y", q.j)
        .with_field("z", q.k)
}

fn read_orientation(parent: &Element) -> Result<UnitQuaternion<Real>> {
    let element = parent.require_child("orientation")?;
    let read = || -> Result<UnitQuaternion<Real>> {
        let q = Quaternion::new(
            element.real("w")?,
            element.real("x")?,
            element.real("y")?,
            element.real("z")?,
        );
        if (q.norm() - 1.0).abs() > UNIT_NORM_TOLERANCE {
            return Err(Error::deserialization(
                "orientation",
                format!("quaternion norm {} is not 1", q.norm()),
            ));
        }
        // Stored components are kept bit-for-bit so round trips are exact.
        Ok(UnitQuaternion::new_unchecked(q))
    };
    read().map_err(|e| within(&parent.name, e))
}

fn read_bits(element: &Element, key: &str) -> Result<u8> {
    let value = element.int(key)?;
    u8::try_from(value)
        .map_err(|_| Error::deserialization(format!("{}.{}", element.name, key), format!("{} is not a valid mask", value)))
}

impl CameraState {
    fn to_element(&self) -> Element {
        Element::new("camera")
            .with_field("fov", self.fov)
            .with_field("near", self.near)
            .with_field("far", self.far)
            .with_child(point_element("position", &self.position))
            .with_child(point_element("target", &self.target))
            .with_child(vector_element("up", &self.up))
    }

    fn from_element(element: &Element) -> Result<Self> {
        let state = Self {
            position: read_point(element, "position")?,
            target: read_point(element, "target")?,
            up: read_vector(element, "up")?,
            fov: element.real("fov")?,
            near: element.real("near")?,
            far: element.real("far")?,
        };
        state.validate()?;
        Ok(state)
    }

    /// Reject cameras that cannot produce a view basis
    fn validate(&self) -> Result<()> {
        let finite = |v: &Vector3<Real>| v.iter().all(|c| c.is_finite());
        if !finite(&self.position.coords) {
            return Err(Error::deserialization("camera.position", "is not finite"));
        }
        if !finite(&self.target.coords) {
            return Err(Error::deserialization("camera.target", "is not finite"));
        }
        if !finite(&self.up) {
            return Err(Error::deserialization("camera.up", "is not finite"));
        }
        if !(self.fov.is_finite() && self.fov > 0.0) {
            return Err(Error::deserialization("camera.fov", "must be positive"));
        }
        if !(self.near > 0.0 && self.far.is_finite() && self.far > self.near) {
            return Err(Error::deserialization("camera.far", "clipping range is empty"));
        }

        let view = self.target - self.position;
        if view.norm() <= CAMERA_BASIS_TOLERANCE {
            return Err(Error::deserialization("camera.target", "coincides with the camera position"));
        }
        if self.up.norm() <= CAMERA_BASIS_TOLERANCE {
            return Err(Error::deserialization("camera.up", "is a zero vector"));
        }
        if view.cross(&self.up).norm() <= CAMERA_BASIS_TOLERANCE * view.norm() * self.up.norm() {
            return Err(Error::deserialization("camera.up", "is parallel to the view direction"));
        }
        Ok(())
    }
}

impl PlaneState {
    fn to_element(&self, index: usize) -> Element {
        Element::new("plane")
            .with_field("index", index as i64)
            .with_field("active", self.active)
            .with_field("bound", self.bound)
            .with_child(point_element("position", &self.pose.position))
            .with_child(orientation_element(&self.pose.orientation))
    }

    fn from_element(element: &Element) -> Result<(usize, Self)> {
        let raw_index = element.int("index")?;
        let index = usize::try_from(raw_index)
            .ok()
            .filter(|&i| i < NUM_CLIP_PLANES)
            .ok_or_else(|| {
                Error::deserialization("plane.index", format!("{} is not a clip plane index", raw_index))
            })?;
        let state = Self {
            pose: Pose::new(read_point(element, "position")?, read_orientation(element)?),
            active: element.boolean("active")?,
            bound: element.boolean("bound")?,
        };
        Ok((index, state))
    }
}

fn display_to_element(display: &DisplayOptions) -> Element {
    Element::new("display")
        .with_field("grid_subdivide", display.grid_subdivide)
        .with_field("display_grid_numbers", display.display_grid_numbers)
        .with_field("auto_grid", display.auto_grid)
        .with_field("draw_scale", display.draw_scale)
        .with_field("wireframe", display.wireframe)
        .with_child(Element::new("grid").with_field("normals", display.grid.normals()))
        .with_child(Element::new("time_display").with_field("mask", display.time_display.bits() as i64))
        .with_child(
            Element::new("background")
                .with_field("r", display.background[0] as f64)
                .with_field("g", display.background[1] as f64)
                .with_field("b", display.background[2] as f64),
        )
}

fn display_from_element(element: &Element) -> Result<DisplayOptions> {
    let grid_element = element.require_child("grid")?;
    let normals = grid_element.text("normals").map_err(|e| within(&element.name, e))?;
    let grid = GridAxes::from_normals(normals).ok_or_else(|| {
        Error::deserialization("display.grid.normals", format!("`{}` is not a set of axes", normals))
    })?;
    let time_element = element.require_child("time_display")?;
    let time_display = TimeDisplay::from_bits(read_bits(time_element, "mask").map_err(|e| within(&element.name, e))?);
    let background_element = element.require_child("background")?;
    let channel = |key: &str| -> Result<f32> {
        background_element
            .real(key)
            .map(|v| v as f32)
            .map_err(|e| within(&element.name, e))
    };
    Ok(DisplayOptions {
        grid,
        grid_subdivide: element.boolean("grid_subdivide")?,
        display_grid_numbers: element.boolean("display_grid_numbers")?,
        auto_grid: element.boolean("auto_grid")?,
        draw_scale: element.boolean("draw_scale")?,
        time_display,
        wireframe: element.boolean("wireframe")?,
        background: [channel("r")?, channel("g")?, channel("b")?],
    })
}

impl ViewerState {
    /// Export as a structured element named `name`
    pub fn to_element(&self, name: &str) -> Element {
        let mut planes = Element::new("clip_planes");
        for (index, plane) in self.planes.iter().enumerate() {
            planes.push_child(plane.to_element(index));
        }
        Element::new(name)
            .with_child(self.camera.to_element())
            .with_child(planes)
            .with_child(display_to_element(&self.display))
    }

    /// Import from a structured element.
    ///
    /// Every field is parsed and validated before a value is returned, so a
    /// caller applying the result never sees a partially read state.
    pub fn from_element(element: &Element) -> Result<Self> {
        let root = element.name.clone();
        let parse = || -> Result<Self> {
            let camera_element = element.require_child("camera")?;
            let camera = CameraState::from_element(camera_element)?;

            let planes_element = element.require_child("clip_planes")?;
            let mut planes: Vec<Option<PlaneState>> = vec![None; NUM_CLIP_PLANES];
            for (position, plane_element) in planes_element.children_named("plane").enumerate() {
                let (index, plane) = PlaneState::from_element(plane_element)
                    .map_err(|e| within(&format!("clip_planes[{}]", position), e))?;
                if planes[index].replace(plane).is_some() {
                    return Err(Error::deserialization(
                        "clip_planes",
                        format!("plane {} appears more than once", index),
                    ));
                }
            }
            let planes = planes
                .into_iter()
                .enumerate()
                .map(|(index, plane)| {
                    plane.ok_or_else(|| Error::deserialization("clip_planes", format!("plane {} is missing", index)))
                })
                .collect::<Result<Vec<_>>>()?;

            let display = display_from_element(element.require_child("display")?)?;
            Ok(Self { camera, planes, display })
        };
        parse().map_err(|e| match e {
            Error::Deserialization { ref field, .. } if field.starts_with(&format!("{}.", root)) => e,
            other => within(&root, other),
        })
    }

    /// Serialize to the string form stored in viewer-state slots
    pub fn to_slot_string(&self) -> Result<String> {
        self.to_element(VIEWER_STATE_ELEMENT).to_json()
    }

    /// Parse the string form stored in viewer-state slots
    pub fn from_slot_string(data: &str) -> Result<Self> {
        Self::from_element(&Element::from_json(data)?)
    }

    /// Indices of bound planes
    pub fn bound_planes(&self) -> impl Iterator<Item = usize> + '_ {
        self.planes
            .iter()
            .enumerate()
            .filter(|(_, plane)| plane.bound)
            .map(|(index, _)| index)
    }
}
