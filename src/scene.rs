use glam::{EulerRot, Mat4, Quat, Vec3};
use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};

use crate::artwork::ArtworkMetadata;
use crate::error::SceneError;
use crate::hit::Hit;
use crate::panel::ButtonAction;
use crate::ray::Ray;
use crate::role::{self, Classification, Role};

/// Identity of an object in the [`Scene`]. Ids of removed objects are reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(u32);

impl ObjectId {
    #[cfg(test)]
    pub(crate) const fn from_raw(index: u32) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Geometry used for ray intersection, in the object's local space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    /// Pure transform node, never hit.
    Group,
    /// Double-sided rectangle in the local XY plane, centred on the origin.
    Plane { width: f32, height: f32 },
    /// Axis-aligned box centred on the origin.
    Cuboid { size: Vec3 },
    Sphere { radius: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpotLight {
    pub intensity: f32,
}

/// Entity of the scene graph.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    pub name: String,
    /// Semantic tag (`floor`, `obstacle`, `rig`, `dimmer`) used alongside the name.
    pub tag: Option<String>,
    pub transform: Transform,
    pub visible: bool,
    /// Helpers such as the teleport marker opt out of ray casts entirely.
    pub raycastable: bool,
    pub shape: Shape,
    /// Material tint, linear RGB in `0..1`.
    pub color: Vec3,
    pub light: Option<SpotLight>,
    pub artwork: Option<ArtworkMetadata>,
    pub button: Option<ButtonAction>,
    /// Spotlight brightened while this object is hovered.
    pub spotlight: Option<ObjectId>,
    parent: Option<ObjectId>,
    children: Vec<ObjectId>,
}

impl Default for SceneObject {
    fn default() -> Self {
        Self {
            name: String::new(),
            tag: None,
            transform: Transform::default(),
            visible: true,
            raycastable: true,
            shape: Shape::Group,
            color: Vec3::ONE,
            light: None,
            artwork: None,
            button: None,
            spotlight: None,
            parent: None,
            children: Vec::new(),
        }
    }
}

impl SceneObject {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_shape(mut self, shape: Shape) -> Self {
        self.shape = shape;
        self
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.transform.position = position;
        self
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.transform.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.transform.scale = scale;
        self
    }

    pub fn with_color(mut self, color: Vec3) -> Self {
        self.color = color;
        self
    }

    pub fn with_light(mut self, light: SpotLight) -> Self {
        self.light = Some(light);
        self
    }

    pub fn with_artwork(mut self, artwork: ArtworkMetadata) -> Self {
        self.artwork = Some(artwork);
        self
    }

    pub fn with_button(mut self, action: ButtonAction) -> Self {
        self.button = Some(action);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn non_raycastable(mut self) -> Self {
        self.raycastable = false;
        self
    }

    pub fn parent(&self) -> Option<ObjectId> {
        self.parent
    }

    pub fn children(&self) -> &[ObjectId] {
        &self.children
    }
}

#[derive(Debug, Clone)]
struct Slot {
    object: SceneObject,
    class: Classification,
}

/// Arena-backed scene graph with precomputed roles.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    slots: Vec<Option<Slot>>,
    roots: Vec<ObjectId>,
    free: Vec<ObjectId>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an object under `parent` (or as a root) and resolves its role.
    ///
    /// A missing parent id inserts the object as a root. Ids of removed
    /// objects are handed out again.
    pub fn add(&mut self, mut object: SceneObject, parent: Option<ObjectId>) -> ObjectId {
        let id = self
            .free
            .pop()
            .unwrap_or(ObjectId(self.slots.len() as u32));
        let parent = parent.filter(|p| self.get(*p).is_some());
        let parent_class = parent.and_then(|p| self.classification(p));
        let class = role::classify(id, &object, parent_class);

        object.parent = parent;
        object.children.clear();
        let slot = Some(Slot { object, class });
        match self.slots.get_mut(id.index()) {
            Some(entry) => *entry = slot,
            None => self.slots.push(slot),
        }
        match parent.and_then(|p| self.slot_mut(p)) {
            Some(slot) => slot.object.children.push(id),
            None => self.roots.push(id),
        }
        id
    }

    /// Removes an object and its whole subtree. Returns how many objects went away.
    pub fn remove(&mut self, id: ObjectId) -> usize {
        let Some(parent) = self.get(id).map(SceneObject::parent) else {
            return 0;
        };
        match parent.and_then(|p| self.slot_mut(p)) {
            Some(slot) => slot.object.children.retain(|child| *child != id),
            None => self.roots.retain(|root| *root != id),
        }

        let mut removed = 0;
        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            if let Some(slot) = self.slots.get_mut(next.index()).and_then(Option::take) {
                pending.extend(slot.object.children);
                self.free.push(next);
                removed += 1;
            }
        }
        removed
    }

    pub fn get(&self, id: ObjectId) -> Option<&SceneObject> {
        self.slot(id).map(|slot| &slot.object)
    }

    /// Mutable access for transforms, visibility, tint and light values.
    ///
    /// Names and tags changed through this handle are not re-classified.
    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        self.slot_mut(id).map(|slot| &mut slot.object)
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.slot(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn roots(&self) -> &[ObjectId] {
        &self.roots
    }

    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &SceneObject)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| {
                slot.as_ref()
                    .map(|slot| (ObjectId(index as u32), &slot.object))
            })
    }

    pub fn find_by_name(&self, name: &str) -> Option<ObjectId> {
        self.iter()
            .find(|(_, object)| object.name == name)
            .map(|(id, _)| id)
    }

    pub fn classification(&self, id: ObjectId) -> Option<Classification> {
        self.slot(id).map(|slot| slot.class)
    }

    pub fn role(&self, id: ObjectId) -> Role {
        self.classification(id).map_or(Role::None, |class| class.role)
    }

    /// Returns true when `id` is `ancestor` or lies somewhere below it.
    pub fn is_descendant_of(&self, id: ObjectId, ancestor: ObjectId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.get(node).and_then(SceneObject::parent);
        }
        false
    }

    pub fn world_matrix(&self, id: ObjectId) -> Mat4 {
        let mut matrix = Mat4::IDENTITY;
        let mut current = self.get(id);
        while let Some(object) = current {
            matrix = object.transform.matrix() * matrix;
            current = object.parent.and_then(|p| self.get(p));
        }
        matrix
    }

    pub fn world_position(&self, id: ObjectId) -> Vec3 {
        self.world_matrix(id).transform_point3(Vec3::ZERO)
    }

    /// An object is rendered, and therefore hittable, only when it and all
    /// of its ancestors are visible.
    pub fn is_visible(&self, id: ObjectId) -> bool {
        let mut current = self.get(id);
        while let Some(object) = current {
            if !object.visible {
                return false;
            }
            current = object.parent.and_then(|p| self.get(p));
        }
        self.contains(id)
    }

    /// Intersects `ray` with every visible, raycastable object (optionally
    /// only those under `root`) and returns the hits sorted by distance.
    pub fn intersect(&self, ray: &Ray, root: Option<ObjectId>) -> Vec<Hit> {
        let mut hits = Vec::new();
        self.intersect_into(ray, root, &mut hits);
        hits
    }

    /// Like [`Scene::intersect`], reusing the caller's buffer.
    pub fn intersect_into(&self, ray: &Ray, root: Option<ObjectId>, hits: &mut Vec<Hit>) {
        hits.clear();
        for (id, object) in self.iter() {
            if !object.raycastable || object.shape == Shape::Group {
                continue;
            }
            if root.is_some_and(|root| !self.is_descendant_of(id, root)) {
                continue;
            }
            if !self.is_visible(id) {
                continue;
            }
            let world = self.world_matrix(id);
            if world.determinant().abs() <= f32::EPSILON {
                continue;
            }
            let inverse = world.inverse();
            let origin = inverse.transform_point3(ray.origin);
            let direction = inverse.transform_vector3(ray.direction);
            if let Some(distance) = intersect_local(object.shape, origin, direction) {
                hits.push(Hit {
                    object: id,
                    point: ray.at(distance),
                    distance,
                });
            }
        }
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    }

    /// Pairs every interactable without an explicit spotlight with a
    /// spotlight sibling, if one exists.
    pub fn link_spotlights(&mut self) {
        let mut links = Vec::new();
        for (id, object) in self.iter() {
            if object.artwork.is_none() || object.spotlight.is_some() {
                continue;
            }
            let siblings = match object.parent.and_then(|p| self.get(p)) {
                Some(parent) => parent.children(),
                None => self.roots.as_slice(),
            };
            let light = siblings
                .iter()
                .copied()
                .find(|s| *s != id && self.get(*s).is_some_and(|o| o.light.is_some()));
            if let Some(light) = light {
                links.push((id, light));
            }
        }
        for (id, light) in links {
            if let Some(object) = self.get_mut(id) {
                object.spotlight = Some(light);
            }
        }
    }

    /// Parses the exhibition XML. Nested `<object>` elements become children.
    pub fn from_xml(xml: &str) -> Result<Self, SceneError> {
        let document = Document::parse(xml)?;
        let mut scene = Self::new();
        for node in document
            .root_element()
            .children()
            .filter(|n| n.has_tag_name("object"))
        {
            scene.add_xml_node(&node, None)?;
        }
        scene.link_spotlights();
        Ok(scene)
    }

    fn add_xml_node(
        &mut self,
        node: &Node<'_, '_>,
        parent: Option<ObjectId>,
    ) -> Result<(), SceneError> {
        let mut object = SceneObject::new(required_text(node, "name")?);
        object.tag = optional_text(node, "tag");
        object.shape = parse_shape(optional_text(node, "shape"))?;
        object.color = parse_color(optional_text(node, "color"), object.color)?;
        object.transform.position =
            parse_vec3("position", optional_text(node, "position"), Vec3::ZERO)?;
        let rotation = parse_vec3("rotation", optional_text(node, "rotation"), Vec3::ZERO)?;
        object.transform.rotation = Quat::from_euler(
            EulerRot::XYZ,
            rotation.x.to_radians(),
            rotation.y.to_radians(),
            rotation.z.to_radians(),
        );
        object.transform.scale = parse_vec3("scale", optional_text(node, "scale"), Vec3::ONE)?;
        object.visible = parse_bool("visible", optional_text(node, "visible"), true)?;
        if optional_text(node, "type").as_deref() == Some("spotlight") {
            let intensity = parse_f32("intensity", optional_text(node, "intensity"), 1.0)?;
            object.light = Some(SpotLight { intensity });
        }
        if let Some(artwork) = node.children().find(|c| c.has_tag_name("artwork")) {
            object.artwork = Some(parse_artwork(&artwork)?);
        }

        let id = self.add(object, parent);
        for child in node.children().filter(|n| n.has_tag_name("object")) {
            self.add_xml_node(&child, Some(id))?;
        }
        Ok(())
    }

    fn slot(&self, id: ObjectId) -> Option<&Slot> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    fn slot_mut(&mut self, id: ObjectId) -> Option<&mut Slot> {
        self.slots.get_mut(id.index()).and_then(Option::as_mut)
    }
}

fn intersect_local(shape: Shape, origin: Vec3, direction: Vec3) -> Option<f32> {
    let t = match shape {
        Shape::Group => return None,
        Shape::Plane { width, height } => {
            if direction.z.abs() < 1e-6 {
                return None;
            }
            let t = -origin.z / direction.z;
            let point = origin + direction * t;
            if point.x.abs() > width * 0.5 || point.y.abs() > height * 0.5 {
                return None;
            }
            t
        }
        Shape::Cuboid { size } => {
            let half = size * 0.5;
            let inv = direction.recip();
            let t1 = (-half - origin) * inv;
            let t2 = (half - origin) * inv;
            let tmin = t1.min(t2).max_element();
            let tmax = t1.max(t2).min_element();
            if tmax < 0.0 || tmin > tmax {
                return None;
            }
            if tmin < 0.0 {
                tmax
            } else {
                tmin
            }
        }
        Shape::Sphere { radius } => {
            let a = direction.length_squared();
            let b = 2.0 * origin.dot(direction);
            let c = origin.length_squared() - radius * radius;
            let discriminant = b * b - 4.0 * a * c;
            if a <= f32::EPSILON || discriminant < 0.0 {
                return None;
            }
            let root = discriminant.sqrt();
            let near = (-b - root) / (2.0 * a);
            let far = (-b + root) / (2.0 * a);
            if near >= 0.0 {
                near
            } else {
                far
            }
        }
    };
    (t.is_finite() && t >= 0.0).then_some(t)
}

fn required_text(node: &Node<'_, '_>, tag: &'static str) -> Result<String, SceneError> {
    optional_text(node, tag).ok_or(SceneError::MissingTag { tag })
}

fn optional_text(node: &Node<'_, '_>, tag: &str) -> Option<String> {
    node.children()
        .find(|child| child.has_tag_name(tag))
        .and_then(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(|text| text.to_string())
}

fn invalid(tag: &'static str, value: &str, reason: impl ToString) -> SceneError {
    SceneError::InvalidValue {
        tag,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_numbers(tag: &'static str, value: &str, count: usize) -> Result<Vec<f32>, SceneError> {
    let numbers = value
        .split_whitespace()
        .map(|component| component.parse::<f32>().map_err(|err| invalid(tag, value, err)))
        .collect::<Result<Vec<_>, _>>()?;
    if numbers.len() < count {
        return Err(invalid(tag, value, format!("expected {count} components")));
    }
    Ok(numbers)
}

fn parse_vec3(
    tag: &'static str,
    value: Option<String>,
    default: Vec3,
) -> Result<Vec3, SceneError> {
    let Some(value) = value else {
        return Ok(default);
    };
    let n = parse_numbers(tag, &value, 3)?;
    Ok(Vec3::new(n[0], n[1], n[2]))
}

fn parse_color(value: Option<String>, default: Vec3) -> Result<Vec3, SceneError> {
    let Some(value) = value else {
        return Ok(default);
    };
    let n = parse_numbers("color", &value, 3)?;
    Ok(Vec3::new(n[0] / 255.0, n[1] / 255.0, n[2] / 255.0))
}

fn parse_f32(tag: &'static str, value: Option<String>, default: f32) -> Result<f32, SceneError> {
    match value {
        Some(value) => value.parse::<f32>().map_err(|err| invalid(tag, &value, err)),
        None => Ok(default),
    }
}

fn parse_bool(
    tag: &'static str,
    value: Option<String>,
    default: bool,
) -> Result<bool, SceneError> {
    match value.as_deref() {
        None => Ok(default),
        Some("true") | Some("1") => Ok(true),
        Some("false") | Some("0") => Ok(false),
        Some(other) => Err(invalid(tag, other, "expected true or false")),
    }
}

fn parse_shape(value: Option<String>) -> Result<Shape, SceneError> {
    let Some(value) = value else {
        return Ok(Shape::Group);
    };
    let mut parts = value.splitn(2, char::is_whitespace);
    let kind = parts.next().unwrap_or_default();
    let args = parts.next().unwrap_or_default();
    match kind {
        "group" => Ok(Shape::Group),
        "plane" => {
            let n = parse_numbers("shape", args, 2)?;
            Ok(Shape::Plane {
                width: n[0],
                height: n[1],
            })
        }
        "box" => {
            let n = parse_numbers("shape", args, 3)?;
            Ok(Shape::Cuboid {
                size: Vec3::new(n[0], n[1], n[2]),
            })
        }
        "sphere" => {
            let n = parse_numbers("shape", args, 1)?;
            Ok(Shape::Sphere { radius: n[0] })
        }
        other => Err(SceneError::UnknownShape(other.to_string())),
    }
}

fn parse_artwork(node: &Node<'_, '_>) -> Result<ArtworkMetadata, SceneError> {
    Ok(ArtworkMetadata {
        id: optional_text(node, "id"),
        title: optional_text(node, "title"),
        author: optional_text(node, "author"),
        description: optional_text(node, "description"),
        src: optional_text(node, "src"),
        width: optional_text(node, "width")
            .map(|w| parse_f32("width", Some(w), 1.0))
            .transpose()?,
        height: optional_text(node, "height")
            .map(|h| parse_f32("height", Some(h), 1.0))
            .transpose()?,
    })
}
