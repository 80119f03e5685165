//! Bevy implementation of the panorama render backend.
//!
//! The sphere, its per-room textures and the hotspot markers are plain
//! entities and assets. Every handle the core renderer holds maps to a
//! [`SceneHandle`], and releasing it despawns the entity and removes the
//! assets it owns.

use bevy::asset::RenderAssetUsages;
use bevy::ecs::system::SystemParam;
use bevy::mesh::{Indices, PrimitiveTopology};
use bevy::prelude::*;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};
use roomtour::{
    DecodedImage, Hotspot, HotspotId, MarkerStyle, RenderBackend, RoomId, SphereGeometry,
};

/// Marker fill colour (iOS system red).
const MARKER_COLOR: Color = Color::srgba(1.0, 0.231, 0.188, 0.8);
/// Ring colour around markers.
const RING_COLOR: Color = Color::srgba(1.0, 1.0, 1.0, 0.6);
/// Colour of the sphere before the first panorama arrives.
const EMPTY_SPHERE_COLOR: Color = Color::srgb(0.05, 0.05, 0.06);
/// Ring tessellation.
const RING_RESOLUTION: u32 = 24;

/// The panorama sphere entity.
#[derive(Component)]
pub struct PanoramaSphere;

/// A hotspot marker entity.
#[derive(Component, Debug, Clone)]
pub struct HotspotMarker(pub HotspotId);

/// A backend resource owned by the core renderer.
#[derive(Debug, Clone)]
pub enum SceneHandle {
    Sphere {
        entity: Entity,
        mesh: Handle<Mesh>,
        material: Handle<StandardMaterial>,
    },
    /// A panorama and the unlit material that shows it.
    Texture {
        image: Handle<Image>,
        material: Handle<StandardMaterial>,
    },
    Marker {
        entity: Entity,
        meshes: [Handle<Mesh>; 2],
        materials: [Handle<StandardMaterial>; 2],
    },
}

/// Convert the core sphere geometry to a Bevy mesh.
///
/// No normals: the panorama material is unlit.
pub fn sphere_mesh(geometry: &SphereGeometry) -> Mesh {
    let positions: Vec<[f32; 3]> = geometry.positions.iter().map(|p| p.to_array()).collect();
    let uvs: Vec<[f32; 2]> = geometry.uvs.iter().map(|uv| uv.to_array()).collect();

    let mut mesh = Mesh::new(
        PrimitiveTopology::TriangleList,
        RenderAssetUsages::default(),
    );
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
    mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, uvs);
    mesh.insert_indices(Indices::U32(geometry.indices.clone()));
    mesh
}

/// Create a Bevy image from a decoded panorama.
pub fn panorama_image(image: DecodedImage) -> Image {
    Image::new(
        Extent3d {
            width: image.width,
            height: image.height,
            depth_or_array_layers: 1,
        },
        TextureDimension::D2,
        image.data,
        TextureFormat::Rgba8UnormSrgb,
        RenderAssetUsages::default(),
    )
}

/// System-side access to everything the renderer creates.
#[derive(SystemParam)]
pub struct SceneBackend<'w, 's> {
    commands: Commands<'w, 's>,
    meshes: ResMut<'w, Assets<Mesh>>,
    materials: ResMut<'w, Assets<StandardMaterial>>,
    images: ResMut<'w, Assets<Image>>,
    markers: Query<'w, 's, &'static mut Transform, With<HotspotMarker>>,
}

impl RenderBackend for SceneBackend<'_, '_> {
    type Handle = SceneHandle;

    fn create_sphere(&mut self, geometry: &SphereGeometry) -> SceneHandle {
        let mesh = self.meshes.add(sphere_mesh(geometry));
        let material = self.materials.add(StandardMaterial {
            base_color: EMPTY_SPHERE_COLOR,
            unlit: true,
            ..default()
        });
        let entity = self
            .commands
            .spawn((
                PanoramaSphere,
                Mesh3d(mesh.clone()),
                MeshMaterial3d(material.clone()),
                Transform::IDENTITY,
            ))
            .id();
        SceneHandle::Sphere {
            entity,
            mesh,
            material,
        }
    }

    fn upload_texture(&mut self, room: &RoomId, image: DecodedImage) -> SceneHandle {
        tracing::debug!(
            "Uploading panorama for '{}': {}x{}",
            room,
            image.width,
            image.height
        );
        let image = self.images.add(panorama_image(image));
        let material = self.materials.add(StandardMaterial {
            base_color_texture: Some(image.clone()),
            unlit: true,
            ..default()
        });
        SceneHandle::Texture { image, material }
    }

    fn bind_texture(&mut self, sphere: &SceneHandle, texture: &SceneHandle) {
        let (SceneHandle::Sphere { entity, .. }, SceneHandle::Texture { material, .. }) =
            (sphere, texture)
        else {
            tracing::warn!("bind_texture called with mismatched handles");
            return;
        };
        self.commands
            .entity(*entity)
            .insert(MeshMaterial3d(material.clone()));
    }

    fn spawn_marker(&mut self, id: &HotspotId, hotspot: &Hotspot, style: &MarkerStyle) -> SceneHandle {
        let sphere_mesh = self
            .meshes
            .add(Sphere::new(style.radius).mesh().uv(style.segments, style.segments));
        let ring_mesh = self.meshes.add(
            Annulus::new(style.ring_inner, style.ring_outer)
                .mesh()
                .resolution(RING_RESOLUTION),
        );
        let sphere_material = self.materials.add(StandardMaterial {
            base_color: MARKER_COLOR,
            alpha_mode: AlphaMode::Blend,
            unlit: true,
            ..default()
        });
        let ring_material = self.materials.add(StandardMaterial {
            base_color: RING_COLOR,
            alpha_mode: AlphaMode::Blend,
            unlit: true,
            double_sided: true,
            cull_mode: None,
            ..default()
        });

        // The ring lies in the local XY plane; turning local -Z away from the
        // camera makes it face the viewer at the origin.
        let position = hotspot.position;
        let transform = Transform::from_translation(position)
            .looking_to(position.normalize_or(Vec3::NEG_Z), Vec3::Y);

        let entity = self
            .commands
            .spawn((
                HotspotMarker(id.clone()),
                Mesh3d(sphere_mesh.clone()),
                MeshMaterial3d(sphere_material.clone()),
                transform,
            ))
            .with_children(|parent| {
                parent.spawn((
                    Mesh3d(ring_mesh.clone()),
                    MeshMaterial3d(ring_material.clone()),
                    Transform::IDENTITY,
                ));
            })
            .id();

        SceneHandle::Marker {
            entity,
            meshes: [sphere_mesh, ring_mesh],
            materials: [sphere_material, ring_material],
        }
    }

    fn set_marker_scale(&mut self, marker: &SceneHandle, scale: f32) {
        let SceneHandle::Marker { entity, .. } = marker else {
            return;
        };
        // Markers spawned this frame are not queryable yet; they start at
        // unit scale.
        if let Ok(mut transform) = self.markers.get_mut(*entity) {
            transform.scale = Vec3::splat(scale);
        }
    }

    fn release(&mut self, handle: SceneHandle) {
        match handle {
            SceneHandle::Sphere {
                entity,
                mesh,
                material,
            } => {
                self.commands.entity(entity).despawn();
                self.meshes.remove(&mesh);
                self.materials.remove(&material);
            }
            SceneHandle::Texture { image, material } => {
                self.images.remove(&image);
                self.materials.remove(&material);
            }
            SceneHandle::Marker {
                entity,
                meshes,
                materials,
            } => {
                self.commands.entity(entity).despawn();
                for mesh in &meshes {
                    self.meshes.remove(mesh);
                }
                for material in &materials {
                    self.materials.remove(material);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use roomtour::panorama_sphere;

    use super::*;

    #[test]
    fn test_sphere_mesh_attributes() {
        let geometry = panorama_sphere(500.0, 8, 4);
        let mesh = sphere_mesh(&geometry);
        assert_eq!(mesh.count_vertices(), geometry.positions.len());
        assert_eq!(
            mesh.indices().map(Indices::len),
            Some(geometry.indices.len())
        );
        assert!(mesh.attribute(Mesh::ATTRIBUTE_UV_0).is_some());
    }

    #[test]
    fn test_panorama_image_size() {
        let image = panorama_image(DecodedImage::new(vec![0; 4 * 3 * 4], 4, 3));
        assert_eq!(image.width(), 4);
        assert_eq!(image.height(), 3);
    }
}
