/// Avatar catalog: the playable characters.
///
/// Image references are opaque path keys. The presentation layer resolves
/// them to something drawable; the simulation only passes them around.

/// Number of frames in every walk cycle.
pub const WALK_FRAMES: usize = 7;

#[derive(Debug, PartialEq, Eq)]
pub struct Avatar {
    pub id: &'static str,
    pub name: &'static str,
    pub stand_image: &'static str,
    pub walk_images: [&'static str; WALK_FRAMES],
    pub object_image: &'static str,
}

pub static CATALOG: [Avatar; 3] = [
    Avatar {
        id: "female",
        name: "Female",
        stand_image: "Players/Female/female_stand.png",
        walk_images: [
            "Players/Female/female_walk0.png",
            "Players/Female/female_walk1.png",
            "Players/Female/female_walk2.png",
            "Players/Female/female_walk3.png",
            "Players/Female/female_walk4.png",
            "Players/Female/female_walk5.png",
            "Players/Female/female_walk6.png",
        ],
        object_image: "Objects/female.png",
    },
    Avatar {
        id: "male",
        name: "Male",
        stand_image: "Players/Male/male_stand.png",
        walk_images: [
            "Players/Male/male_walk0.png",
            "Players/Male/male_walk1.png",
            "Players/Male/male_walk2.png",
            "Players/Male/male_walk3.png",
            "Players/Male/male_walk4.png",
            "Players/Male/male_walk5.png",
            "Players/Male/male_walk6.png",
        ],
        object_image: "Objects/male.png",
    },
    Avatar {
        id: "robot",
        name: "Robot",
        stand_image: "Players/Robot/robot_stand.png",
        walk_images: [
            "Players/Robot/robot_walk0.png",
            "Players/Robot/robot_walk1.png",
            "Players/Robot/robot_walk2.png",
            "Players/Robot/robot_walk3.png",
            "Players/Robot/robot_walk4.png",
            "Players/Robot/robot_walk5.png",
            "Players/Robot/robot_walk6.png",
        ],
        object_image: "Objects/robot.png",
    },
];

impl Avatar {
    /// Every image this avatar references, stand frame first.
    pub fn images(&self) -> impl Iterator<Item = &'static str> + '_ {
        std::iter::once(self.stand_image)
            .chain(self.walk_images.iter().copied())
            .chain(std::iter::once(self.object_image))
    }
}
