//! Skeleton binding.
//!
//! Bones arrive as a flat list with parent indices, heads and optional tails
//! in the document's convention. [`bind_skeleton`] validates the hierarchy,
//! converts the joint positions and records a parents-first order. Bind poses
//! for a mesh are then looked up per joint slot with [`Skeleton::bind_poses`].

use crate::convert::Transform;
use crate::document::Bone;
use crate::error::{LbsmError, Result};
use glam::{Mat4, Vec3};
use serde::Serialize;

/// A converted bone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkeletonBone {
    pub name: String,
    pub parent: Option<usize>,
    pub head: [f32; 3],
    pub tail: Option<[f32; 3]>,
    /// Head relative to the parent's head; the head itself for roots.
    pub local_offset: [f32; 3],
}

impl SkeletonBone {
    /// Bone length, when the tail is known.
    pub fn length(&self) -> Option<f32> {
        self.tail
            .map(|tail| Vec3::from(tail).distance(Vec3::from(self.head)))
    }
}

/// A validated bone forest in the target convention.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Skeleton {
    pub bones: Vec<SkeletonBone>,
    /// Every bone index, each after its parent.
    pub traversal_order: Vec<usize>,
}

impl Skeleton {
    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    pub fn roots(&self) -> impl Iterator<Item = usize> + '_ {
        self.bones
            .iter()
            .enumerate()
            .filter(|(_, b)| b.parent.is_none())
            .map(|(i, _)| i)
    }

    pub fn children(&self, bone: usize) -> impl Iterator<Item = usize> + '_ {
        self.bones
            .iter()
            .enumerate()
            .filter(move |(_, b)| b.parent == Some(bone))
            .map(|(i, _)| i)
    }

    pub fn find(&self, name: &str) -> Option<usize> {
        self.bones.iter().position(|b| b.name == name)
    }

    /// Inverse bind matrix of one bone: a translation by the negated head.
    pub fn bind_pose(&self, bone: usize) -> Option<Mat4> {
        self.bones
            .get(bone)
            .map(|b| Mat4::from_translation(-Vec3::from(b.head)))
    }

    /// One bind pose per joint slot of a mesh.
    pub fn bind_poses(&self, joints: &[usize]) -> Result<Vec<Mat4>> {
        joints
            .iter()
            .enumerate()
            .map(|(slot, &bone)| {
                self.bind_pose(bone).ok_or_else(|| {
                    LbsmError::InvalidReference(format!(
                        "joint slot {} refers to bone {} of {}",
                        slot,
                        bone,
                        self.bones.len()
                    ))
                })
            })
            .collect()
    }
}

/// Validate the hierarchy and convert every bone with `transform`.
pub fn bind_skeleton(bones: &[Bone], transform: &Transform) -> Result<Skeleton> {
    for (i, bone) in bones.iter().enumerate() {
        if let Some(parent) = bone.parent {
            if parent >= bones.len() {
                return Err(LbsmError::InvalidReference(format!(
                    "bone {} ('{}') has parent {} of {}",
                    i,
                    bone.name,
                    parent,
                    bones.len()
                )));
            }
        }
    }
    check_acyclic(bones)?;

    let heads: Vec<[f32; 3]> = bones.iter().map(|b| transform.apply_point(b.head)).collect();
    let converted = bones
        .iter()
        .zip(&heads)
        .map(|(bone, &head)| {
            let local_offset = match bone.parent {
                Some(parent) => (Vec3::from(head) - Vec3::from(heads[parent])).to_array(),
                None => head,
            };
            SkeletonBone {
                name: bone.name.clone(),
                parent: bone.parent,
                head,
                tail: bone.tail.map(|t| transform.apply_point(t)),
                local_offset,
            }
        })
        .collect();

    let skeleton = Skeleton {
        bones: converted,
        traversal_order: traversal_order(bones),
    };
    tracing::debug!(bones = skeleton.len(), "bound skeleton");
    Ok(skeleton)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnChain,
    Done,
}

/// Walk each parent chain once; reaching a bone already on the current chain is a cycle.
fn check_acyclic(bones: &[Bone]) -> Result<()> {
    let mut marks = vec![Mark::Unvisited; bones.len()];
    let mut chain = Vec::new();
    for start in 0..bones.len() {
        let mut current = Some(start);
        while let Some(bone) = current {
            match marks[bone] {
                Mark::Done => break,
                Mark::OnChain => return Err(LbsmError::CycleDetected(bone)),
                Mark::Unvisited => {
                    marks[bone] = Mark::OnChain;
                    chain.push(bone);
                    current = bones[bone].parent;
                }
            }
        }
        for bone in chain.drain(..) {
            marks[bone] = Mark::Done;
        }
    }
    Ok(())
}

/// Breadth-first from the roots, children in index order. Requires an acyclic forest.
fn traversal_order(bones: &[Bone]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..bones.len())
        .filter(|&i| bones[i].parent.is_none())
        .collect();
    let mut next = 0;
    while next < order.len() {
        let parent = order[next];
        order.extend((0..bones.len()).filter(|&i| bones[i].parent == Some(parent)));
        next += 1;
    }
    order
}
