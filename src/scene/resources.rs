/// Id-keyed pools for models, materials and textures.
/// Ids are handed out by insertion and stay valid for the pool's lifetime.
use crate::geometry::Model;
use crate::material::{Material, MaterialId};
use crate::rendering::texture::Texture;
use std::marker::PhantomData;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ModelId(pub usize);

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct TextureId(pub usize);

/// Append-only storage addressed by a typed id.
pub struct Pool<I, T> {
    items: Vec<T>,
    _id: PhantomData<I>,
}

impl<I, T> Default for Pool<I, T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            _id: PhantomData,
        }
    }
}

impl<I, T> Pool<I, T>
where
    I: From<usize> + Into<usize> + Copy,
{
    pub fn insert(&mut self, item: T) -> I {
        self.items.push(item);
        I::from(self.items.len() - 1)
    }

    #[inline]
    pub fn get(&self, id: I) -> Option<&T> {
        self.items.get(id.into())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

macro_rules! impl_pool_id {
    ($id:ty) => {
        impl From<usize> for $id {
            fn from(i: usize) -> Self {
                Self(i)
            }
        }

        impl From<$id> for usize {
            fn from(id: $id) -> usize {
                id.0
            }
        }
    };
}

impl_pool_id!(ModelId);
impl_pool_id!(TextureId);
impl_pool_id!(MaterialId);

#[derive(Default)]
pub struct Resources {
    pub models: Pool<ModelId, Model>,
    pub materials: Pool<MaterialId, Material>,
    pub textures: Pool<TextureId, Texture>,
}

impl Resources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_model(&mut self, model: Model) -> ModelId {
        self.models.insert(model)
    }

    pub fn add_material(&mut self, material: Material) -> MaterialId {
        self.materials.insert(material)
    }

    pub fn add_texture(&mut self, texture: Texture) -> TextureId {
        self.textures.insert(texture)
    }

    #[inline]
    pub fn model(&self, id: ModelId) -> Option<&Model> {
        self.models.get(id)
    }

    #[inline]
    pub fn material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id)
    }

    #[inline]
    pub fn texture(&self, id: TextureId) -> Option<&Texture> {
        self.textures.get(id)
    }
}
