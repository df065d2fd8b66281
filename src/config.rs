use crate::classify::Category;

/// Everything the generator needs to know about the target API that is not in
/// the registry itself.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Config {
    /// Tag of the core API in `api` attributes.
    pub api: String,

    /// Procedures whose name lacks this prefix are never emitted.
    pub name_prefix: String,

    /// Procedure that resolves every other one. It is obtained from the
    /// bootstrap module rather than loaded.
    pub bootstrap_proc: String,

    /// Procedure that resolves device-level procedures. It takes a device
    /// handle but is loaded at instance level.
    pub device_resolver: String,

    /// First-parameter types that make a procedure instance-level.
    pub instance_handles: Vec<String>,

    /// First-parameter types that make a procedure device-level.
    pub device_handles: Vec<String>,

    pub extensions: ExtensionTable,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api: String::from("vulkan"),
            name_prefix: String::from("vk"),
            bootstrap_proc: String::from("vkGetInstanceProcAddr"),
            device_resolver: String::from("vkGetDeviceProcAddr"),
            instance_handles: strings(&["VkInstance", "VkPhysicalDevice"]),
            device_handles: strings(&["VkDevice", "VkQueue", "VkCommandBuffer"]),
            extensions: ExtensionTable::default(),
        }
    }
}

/// Ordered extension lookup lists. The first group naming a procedure decides
/// its category.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct ExtensionTable(pub Vec<ExtensionGroup>);

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct ExtensionGroup {
    pub category: Category,

    /// Macro that must be defined for the group's code to be compiled.
    pub guard: Option<String>,

    pub names: Vec<String>,
}

impl ExtensionGroup {
    pub fn new(category: Category, guard: Option<&str>, names: &[&str]) -> Self {
        ExtensionGroup {
            category,
            guard: guard.map(String::from),
            names: strings(names),
        }
    }
}

impl ExtensionTable {
    /// Category of the extension procedure `name`; `Category::None` when no
    /// group lists it.
    pub fn category_of(&self, name: &str) -> Category {
        self.0
            .iter()
            .find(|group| group.names.iter().any(|n| n == name))
            .map_or(Category::None, |group| group.category)
    }

    /// Guard macro of `category`, if its code must be conditionally compiled.
    pub fn guard_of(&self, category: Category) -> Option<&str> {
        self.0
            .iter()
            .find(|group| group.category == category)
            .and_then(|group| group.guard.as_deref())
    }
}

impl Default for ExtensionTable {
    fn default() -> Self {
        ExtensionTable(vec![
            ExtensionGroup::new(
                Category::Common,
                None,
                &[
                    // VK_KHR_surface
                    "vkDestroySurfaceKHR",
                    "vkGetPhysicalDeviceSurfaceCapabilitiesKHR",
                    "vkGetPhysicalDeviceSurfaceFormatsKHR",
                    "vkGetPhysicalDeviceSurfacePresentModesKHR",
                    "vkGetPhysicalDeviceSurfaceSupportKHR",
                    // VK_KHR_swapchain
                    "vkAcquireNextImageKHR",
                    "vkCreateSwapchainKHR",
                    "vkDestroySwapchainKHR",
                    "vkGetSwapchainImagesKHR",
                    "vkQueuePresentKHR",
                ],
            ),
            ExtensionGroup::new(
                Category::Wayland,
                Some("VK_USE_PLATFORM_WAYLAND_KHR"),
                &[
                    "vkCreateWaylandSurfaceKHR",
                    "vkGetPhysicalDeviceWaylandPresentationSupportKHR",
                ],
            ),
            ExtensionGroup::new(
                Category::Win32,
                Some("VK_USE_PLATFORM_WIN32_KHR"),
                &[
                    "vkCreateWin32SurfaceKHR",
                    "vkGetPhysicalDeviceWin32PresentationSupportKHR",
                ],
            ),
            ExtensionGroup::new(
                Category::Xcb,
                Some("VK_USE_PLATFORM_XCB_KHR"),
                &[
                    "vkCreateXcbSurfaceKHR",
                    "vkGetPhysicalDeviceXcbPresentationSupportKHR",
                ],
            ),
        ])
    }
}

fn strings(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| String::from(*s)).collect()
}
