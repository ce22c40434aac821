//! Depth classification of photons into skin, muscle and bone.

use tissue_types::config::{DepthConvention, ScatterConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Skin,
    Muscle,
    Bone,
}

impl Layer {
    /// Transport order within one iteration; variates are drawn in this order.
    pub const ORDER: [Layer; 3] = [Layer::Skin, Layer::Muscle, Layer::Bone];
}

/// Depth intervals [cm]: skin [0, skin_max], muscle (skin_max, muscle_max],
/// bone (bone_min, bone_max].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerBoundaries {
    pub skin_max: f64,
    pub muscle_max: f64,
    pub bone_min: f64,
    pub bone_max: f64,
}

impl LayerBoundaries {
    pub fn from_config(config: &ScatterConfig, convention: DepthConvention) -> Self {
        let skin = config.thickness_skin;
        let muscle = config.thickness_muscle;
        let bone = config.thickness_bone;
        match convention {
            DepthConvention::Thickness => LayerBoundaries {
                skin_max: skin,
                muscle_max: skin + muscle,
                bone_min: skin + muscle,
                bone_max: skin + muscle + bone,
            },
            DepthConvention::Cumulative => LayerBoundaries {
                skin_max: skin,
                muscle_max: muscle,
                bone_min: skin + muscle,
                bone_max: bone,
            },
        }
    }

    /// Deepest in-model depth. Photons below it are dropped.
    ///
    /// Always the summed thickness, so under the cumulative convention
    /// depths past `bone_max` stay in the model but belong to no layer.
    pub fn model_depth(config: &ScatterConfig) -> f64 {
        config.thickness_skin + config.thickness_muscle + config.thickness_bone
    }

    pub fn classify(&self, z: f64) -> Option<Layer> {
        if (0.0..=self.skin_max).contains(&z) {
            Some(Layer::Skin)
        } else if z > self.skin_max && z <= self.muscle_max {
            Some(Layer::Muscle)
        } else if z > self.bone_min && z <= self.bone_max {
            Some(Layer::Bone)
        } else {
            None
        }
    }
}

/// Index buckets of one iteration. Mutually exclusive; photons outside every
/// interval are in none of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayerAssignment {
    pub skin: Vec<usize>,
    pub muscle: Vec<usize>,
    pub bone: Vec<usize>,
}

impl LayerAssignment {
    pub fn indices(&self, layer: Layer) -> &[usize] {
        match layer {
            Layer::Skin => &self.skin,
            Layer::Muscle => &self.muscle,
            Layer::Bone => &self.bone,
        }
    }

    pub fn assigned(&self) -> usize {
        self.skin.len() + self.muscle.len() + self.bone.len()
    }
}

/// Single pass over depths.
pub fn assign_layers(z: &[f64], bounds: &LayerBoundaries) -> LayerAssignment {
    let mut out = LayerAssignment::default();
    for (i, &depth) in z.iter().enumerate() {
        match bounds.classify(depth) {
            Some(Layer::Skin) => out.skin.push(i),
            Some(Layer::Muscle) => out.muscle.push(i),
            Some(Layer::Bone) => out.bone.push(i),
            None => {}
        }
    }
    out
}
