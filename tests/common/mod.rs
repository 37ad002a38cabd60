#![allow(dead_code)]

use std::fmt::Write;
use std::fs;
use std::path::{Path, PathBuf};

/// Shape of a generated registry document.
#[derive(Debug, Clone)]
pub struct Fixture {
    pub minor: u32,
    pub patch: u32,
    /// Number of `VK_EXT_feature{i}` device extensions.
    pub extensions: usize,
    /// Adds `VK_KHR_surface` and the win32-only `VK_KHR_win32_surface`.
    pub surface: bool,
}

impl Default for Fixture {
    fn default() -> Fixture {
        Fixture {
            minor: 3,
            patch: 250,
            extensions: 5,
            surface: true,
        }
    }
}

impl Fixture {
    pub fn only_features(patch: u32, extensions: usize) -> Fixture {
        Fixture {
            patch,
            extensions,
            surface: false,
            ..Fixture::default()
        }
    }

    /// Number of extensions a `vulkan` snapshot of this registry contains.
    pub fn vulkan_extensions(&self) -> usize {
        self.extensions + if self.surface { 2 } else { 0 }
    }

    pub fn xml(&self) -> String {
        registry_xml(self)
    }
}

pub fn feature_struct(i: usize) -> String {
    format!("VkPhysicalDeviceFeature{}FeaturesEXT", i)
}

pub fn feature_extension(i: usize) -> String {
    format!("VK_EXT_feature{}", i)
}

pub fn feature_s_type(i: usize) -> String {
    format!("VK_STRUCTURE_TYPE_PHYSICAL_DEVICE_FEATURE{}_FEATURES_EXT", i)
}

pub fn registry_xml(f: &Fixture) -> String {
    let mut x = String::new();

    x.push_str(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<registry>
    <comment>
Copyright 2015-2023 The Khronos Group Inc.
    </comment>

    <platforms comment="Vulkan platform names, reserved for use with platform- and window-system-specific extensions">
        <platform name="xlib" protect="VK_USE_PLATFORM_XLIB_KHR" comment="X Window System, Xlib client library"/>
        <platform name="win32" protect="VK_USE_PLATFORM_WIN32_KHR" comment="Microsoft Win32 API (also refers to Win64 apps)"/>
    </platforms>

    <tags comment="Vulkan vendor/author tags for extensions and layers">
        <tag name="KHR" author="Khronos" contact="Tom Olson @tomolson"/>
        <tag name="EXT" author="Multivendor" contact="Jon Leech @oddhack"/>
        <tag name="NV" author="NVIDIA Corporation" contact="Daniel Koch @dgkoch"/>
    </tags>

    <types comment="Vulkan type definitions">
        <type name="vk_platform" category="include">#include "vk_platform.h"</type>
        <type category="define" requires="VK_MAKE_API_VERSION">// Vulkan 1.0 version number
#define <name>VK_API_VERSION_1_0</name> <type>VK_MAKE_API_VERSION</type>(0, 1, 0, 0)// Patch version should always be set to 0</type>
"#,
    );
    writeln!(
        x,
        r#"        <type api="vulkan" category="define">// Version of this file
#define <name>VK_HEADER_VERSION</name> {patch}</type>
        <type api="vulkansc" category="define">// Version of this file
#define <name>VK_HEADER_VERSION</name> 14</type>
        <type api="vulkan" category="define" requires="VK_HEADER_VERSION">// Complete version of this file
#define <name>VK_HEADER_VERSION_COMPLETE</name> <type>VK_MAKE_API_VERSION</type>(0, 1, {minor}, VK_HEADER_VERSION)</type>
        <type api="vulkansc" category="define" requires="VKSC_API_VARIANT">// Complete version of this file
#define <name>VK_HEADER_VERSION_COMPLETE</name> <type>VK_MAKE_API_VERSION</type>(VKSC_API_VARIANT, 1, 0, VK_HEADER_VERSION)</type>"#,
        patch = f.patch,
        minor = f.minor
    )
    .unwrap();
    x.push_str(
        r#"        <type requires="vk_platform" name="void"/>
        <type requires="vk_platform" name="char"/>
        <type requires="vk_platform" name="float"/>
        <type requires="vk_platform" name="uint32_t"/>
        <type requires="vk_platform" name="uint64_t"/>
        <type category="basetype">typedef <type>uint32_t</type> <name>VkFlags</name>;</type>
        <type category="basetype">typedef <type>uint64_t</type> <name>VkFlags64</name>;</type>
        <type requires="VkQueueFlagBits" category="bitmask">typedef <type>VkFlags</type> <name>VkQueueFlags</name>;</type>
        <type bitvalues="VkPipelineStageFlagBits2" category="bitmask">typedef <type>VkFlags64</type> <name>VkPipelineStageFlags2</name>;</type>
        <type category="bitmask" name="VkPipelineStageFlags2KHR" alias="VkPipelineStageFlags2"/>

        <type category="handle" objtypeenum="VK_OBJECT_TYPE_INSTANCE"><type>VK_DEFINE_HANDLE</type>(<name>VkInstance</name>)</type>
        <type category="handle" parent="VkInstance" objtypeenum="VK_OBJECT_TYPE_PHYSICAL_DEVICE"><type>VK_DEFINE_HANDLE</type>(<name>VkPhysicalDevice</name>)</type>
        <type category="handle" parent="VkPhysicalDevice" objtypeenum="VK_OBJECT_TYPE_DEVICE"><type>VK_DEFINE_HANDLE</type>(<name>VkDevice</name>)</type>
        <type category="handle" parent="VkDevice" objtypeenum="VK_OBJECT_TYPE_QUEUE"><type>VK_DEFINE_HANDLE</type>(<name>VkQueue</name>)</type>
        <type category="handle" parent="VkDevice" objtypeenum="VK_OBJECT_TYPE_COMMAND_POOL"><type>VK_DEFINE_NON_DISPATCHABLE_HANDLE</type>(<name>VkCommandPool</name>)</type>
        <type category="handle" parent="VkCommandPool" objtypeenum="VK_OBJECT_TYPE_COMMAND_BUFFER"><type>VK_DEFINE_HANDLE</type>(<name>VkCommandBuffer</name>)</type>
        <type category="handle" parent="VkDevice" objtypeenum="VK_OBJECT_TYPE_FENCE"><type>VK_DEFINE_NON_DISPATCHABLE_HANDLE</type>(<name>VkFence</name>)</type>
        <type category="handle" parent="VkInstance" objtypeenum="VK_OBJECT_TYPE_SURFACE_KHR"><type>VK_DEFINE_NON_DISPATCHABLE_HANDLE</type>(<name>VkSurfaceKHR</name>)</type>

        <type name="VkResult" category="enum"/>
        <type name="VkStructureType" category="enum"/>
        <type name="VkQueueFlagBits" category="enum"/>
        <type name="VkPipelineStageFlagBits2" category="enum"/>

        <type category="struct" name="VkApplicationInfo">
            <member values="VK_STRUCTURE_TYPE_APPLICATION_INFO"><type>VkStructureType</type> <name>sType</name></member>
            <member optional="true">const <type>void</type>*     <name>pNext</name></member>
            <member optional="true" len="null-terminated">const <type>char</type>*     <name>pApplicationName</name></member>
            <member><type>uint32_t</type>        <name>apiVersion</name></member>
        </type>
        <type category="struct" name="VkDeviceCreateInfo">
            <member values="VK_STRUCTURE_TYPE_DEVICE_CREATE_INFO"><type>VkStructureType</type> <name>sType</name></member>
            <member optional="true">const <type>void</type>*     <name>pNext</name></member>
            <member optional="true"><type>uint32_t</type>               <name>enabledExtensionCount</name></member>
            <member len="enabledExtensionCount,null-terminated">const <type>char</type>* const*      <name>ppEnabledExtensionNames</name></member>
            <member api="vulkansc"><type>uint32_t</type>               <name>faultCount</name></member>
        </type>
        <type category="struct" name="VkPhysicalDeviceLimits" returnedonly="true">
            <member limittype="max"><type>uint32_t</type>               <name>maxViewports</name></member>
            <member limittype="min,max"><type>float</type>                  <name>pointSizeRange</name>[2]</member>
            <member limittype="bitmask"><type>uint32_t</type>              <name>subgroupFlags</name>:8</member>
        </type>
        <type category="union" name="VkClearColorValue" comment="// Union allowing specification of floating point, integer, or unsigned integer color data. Actual value selected is based on image/attachment being cleared.">
            <member><type>float</type>                  <name>float32</name>[4]</member>
            <member><type>uint32_t</type>               <name>uint32</name>[4]</member>
        </type>
        <type category="struct" name="VkFaultData" api="vulkansc" structextends="VkDeviceCreateInfo">
            <member values="VK_STRUCTURE_TYPE_FAULT_DATA"><type>VkStructureType</type> <name>sType</name></member>
            <member optional="true"><type>void</type>*     <name>pNext</name></member>
        </type>
        <type category="struct" name="VkWin32SurfaceCreateInfoKHR">
            <member values="VK_STRUCTURE_TYPE_WIN32_SURFACE_CREATE_INFO_KHR"><type>VkStructureType</type> <name>sType</name></member>
            <member optional="true">const <type>void</type>*     <name>pNext</name></member>
        </type>
        <type category="struct" name="VkDisabledNV" structextends="VkDeviceCreateInfo">
            <member values="VK_STRUCTURE_TYPE_DISABLED_NV"><type>VkStructureType</type> <name>sType</name></member>
        </type>
"#,
    );
    for i in 0..f.extensions {
        writeln!(
            x,
            r#"        <type category="struct" name="{name}" structextends="VkDeviceCreateInfo">
            <member values="{s_type}"><type>VkStructureType</type> <name>sType</name></member>
            <member optional="true"><type>void</type>*     <name>pNext</name></member>
            <member><type>uint32_t</type>               <name>feature{i}</name></member>
        </type>"#,
            name = feature_struct(i),
            s_type = feature_s_type(i),
            i = i
        )
        .unwrap();
    }
    x.push_str(
        r#"    </types>

    <enums name="API Constants" comment="Vulkan hardcoded constants - not an enumerated type, part of the header boilerplate">
        <enum type="uint32_t" value="256" name="VK_MAX_EXTENSION_NAME_SIZE"/>
        <enum type="uint32_t" value="1" name="VK_TRUE"/>
        <enum type="float" value="1000.0F" name="VK_LOD_CLAMP_NONE"/>
        <enum type="uint32_t" value="(~0U)" name="VK_REMAINING_MIP_LEVELS"/>
    </enums>

    <enums name="VkResult" type="enum" comment="API result codes">
        <comment>Return codes (positive values)</comment>
        <enum value="0" name="VK_SUCCESS" comment="Command completed successfully"/>
        <enum value="1" name="VK_NOT_READY" comment="A fence or query has not yet completed"/>
        <comment>Error codes (negative values)</comment>
        <enum value="-1" name="VK_ERROR_OUT_OF_HOST_MEMORY" comment="A host memory allocation has failed"/>
        <unused start="-14"/>
    </enums>
    <enums name="VkStructureType" type="enum" comment="Structure type enumerant">
        <enum value="0" name="VK_STRUCTURE_TYPE_APPLICATION_INFO"/>
        <enum value="3" name="VK_STRUCTURE_TYPE_DEVICE_CREATE_INFO"/>
    </enums>
    <enums name="VkQueueFlagBits" type="bitmask">
        <enum bitpos="0" name="VK_QUEUE_GRAPHICS_BIT" comment="Queue supports graphics operations"/>
        <enum bitpos="1" name="VK_QUEUE_COMPUTE_BIT" comment="Queue supports compute operations"/>
        <enum value="0x00000003" name="VK_QUEUE_GRAPHICS_AND_COMPUTE"/>
    </enums>
    <enums name="VkPipelineStageFlagBits2" type="bitmask" bitwidth="64">
        <enum value="0" name="VK_PIPELINE_STAGE_2_NONE"/>
        <enum bitpos="0" name="VK_PIPELINE_STAGE_2_TOP_OF_PIPE_BIT"/>
        <enum bitpos="40" name="VK_PIPELINE_STAGE_2_HIGH_BIT"/>
        <enum name="VK_PIPELINE_STAGE_2_NONE_KHR" alias="VK_PIPELINE_STAGE_2_NONE"/>
    </enums>

    <commands comment="Vulkan command definitions">
        <command successcodes="VK_SUCCESS" errorcodes="VK_ERROR_OUT_OF_HOST_MEMORY">
            <proto><type>VkResult</type> <name>vkCreateInstance</name></proto>
            <param>const <type>VkApplicationInfo</type>* <name>pApplicationInfo</name></param>
            <param><type>VkInstance</type>* <name>pInstance</name></param>
        </command>
        <command successcodes="VK_SUCCESS,VK_NOT_READY" errorcodes="VK_ERROR_OUT_OF_HOST_MEMORY">
            <proto><type>VkResult</type> <name>vkEnumeratePhysicalDevices</name></proto>
            <param><type>VkInstance</type> <name>instance</name></param>
            <param optional="false,true"><type>uint32_t</type>* <name>pPhysicalDeviceCount</name></param>
            <param optional="true" len="pPhysicalDeviceCount"><type>VkPhysicalDevice</type>* <name>pPhysicalDevices</name></param>
        </command>
        <command>
            <proto><type>void</type> <name>vkGetDeviceQueue</name></proto>
            <param><type>VkDevice</type> <name>device</name></param>
            <param><type>uint32_t</type> <name>queueFamilyIndex</name></param>
            <param><type>VkQueue</type>* <name>pQueue</name></param>
        </command>
        <command successcodes="VK_SUCCESS" errorcodes="VK_ERROR_OUT_OF_HOST_MEMORY">
            <proto><type>VkResult</type> <name>vkCreateFence</name></proto>
            <param><type>VkDevice</type> <name>device</name></param>
            <param><type>VkFence</type>* <name>pFence</name></param>
        </command>
        <command name="vkCreateFenceEXT" alias="vkCreateFence"/>
        <command>
            <proto><type>void</type> <name>vkDestroyFence</name></proto>
            <param><type>VkDevice</type> <name>device</name></param>
            <param optional="true" externsync="true"><type>VkFence</type> <name>fence</name></param>
        </command>
        <command queues="graphics" renderpass="inside" videocoding="outside" cmdbufferlevel="primary,secondary" tasks="action">
            <proto><type>void</type> <name>vkCmdDraw</name></proto>
            <param externsync="true"><type>VkCommandBuffer</type> <name>commandBuffer</name></param>
            <param><type>uint32_t</type> <name>vertexCount</name></param>
        </command>
        <command api="vulkansc" successcodes="VK_SUCCESS">
            <proto><type>VkResult</type> <name>vkGetFaultData</name></proto>
            <param><type>VkDevice</type> <name>device</name></param>
        </command>
        <command>
            <proto><type>void</type> <name>vkDestroySurfaceKHR</name></proto>
            <param><type>VkInstance</type> <name>instance</name></param>
            <param optional="true" externsync="true"><type>VkSurfaceKHR</type> <name>surface</name></param>
        </command>
        <command successcodes="VK_SUCCESS" errorcodes="VK_ERROR_OUT_OF_HOST_MEMORY">
            <proto><type>VkResult</type> <name>vkCreateWin32SurfaceKHR</name></proto>
            <param><type>VkInstance</type> <name>instance</name></param>
            <param>const <type>VkWin32SurfaceCreateInfoKHR</type>* <name>pCreateInfo</name></param>
            <param><type>VkSurfaceKHR</type>* <name>pSurface</name></param>
        </command>
    </commands>

    <feature api="vulkan,vulkansc" name="VK_VERSION_1_0" number="1.0" comment="Vulkan core API interface definitions">
        <require comment="Header boilerplate">
            <type name="vk_platform"/>
            <type name="VK_HEADER_VERSION"/>
        </require>
        <require comment="API constants">
            <enum name="VK_MAX_EXTENSION_NAME_SIZE"/>
            <enum name="VK_TRUE"/>
        </require>
        <require comment="Fundamental types used by many commands and structures">
            <type name="VkResult"/>
            <type name="VkStructureType"/>
            <type name="VkFlags"/>
            <type name="VkQueueFlags"/>
            <type name="VkQueueFlagBits"/>
        </require>
        <require comment="Objects">
            <type name="VkInstance"/>
            <type name="VkPhysicalDevice"/>
            <type name="VkDevice"/>
            <type name="VkQueue"/>
            <type name="VkCommandPool"/>
            <type name="VkCommandBuffer"/>
            <type name="VkFence"/>
            <type name="VkApplicationInfo"/>
            <type name="VkDeviceCreateInfo"/>
            <type name="VkPhysicalDeviceLimits"/>
            <type name="VkClearColorValue"/>
        </require>
        <require comment="Commands">
            <command name="vkCreateInstance"/>
            <command name="vkEnumeratePhysicalDevices"/>
            <command name="vkGetDeviceQueue"/>
            <command name="vkCreateFence"/>
            <command name="vkDestroyFence"/>
            <command name="vkCmdDraw"/>
        </require>
    </feature>
    <feature api="vulkan" name="VK_VERSION_1_1" number="1.1" comment="Vulkan 1.1 core API interface definitions.">
        <require>
            <enum extends="VkStructureType" extnumber="169" offset="0" name="VK_STRUCTURE_TYPE_PHYSICAL_DEVICE_SUBGROUP_PROPERTIES"/>
            <type name="VkPipelineStageFlags2KHR"/>
            <type name="VkPipelineStageFlagBits2"/>
        </require>
    </feature>
    <feature api="vulkansc" name="VKSC_VERSION_1_0" number="1.0" comment="Vulkan SC core API interface definitions">
        <require>
            <enum extends="VkStructureType" extnumber="299" offset="0" name="VK_STRUCTURE_TYPE_FAULT_DATA"/>
            <type name="VkFaultData"/>
            <command name="vkGetFaultData"/>
        </require>
        <remove comment="Commands not supported by Vulkan SC">
            <command name="vkDestroyFence"/>
        </remove>
    </feature>

    <extensions comment="Vulkan extension interface definitions">
"#,
    );

    if f.surface {
        x.push_str(
            r#"        <extension name="VK_KHR_surface" number="1" type="instance" author="KHR" contact="James Jones @cubanismo" supported="vulkan,vulkansc" ratified="vulkan,vulkansc">
            <require>
                <enum value="25" name="VK_KHR_SURFACE_SPEC_VERSION"/>
                <enum value="&quot;VK_KHR_surface&quot;" name="VK_KHR_SURFACE_EXTENSION_NAME"/>
                <enum offset="0" extends="VkResult" dir="-" name="VK_ERROR_SURFACE_LOST_KHR"/>
                <type name="VkSurfaceKHR"/>
                <command name="vkDestroySurfaceKHR"/>
            </require>
        </extension>
        <extension name="VK_KHR_win32_surface" number="10" type="instance" depends="VK_KHR_surface" platform="win32" author="KHR" contact="Jesse Hall @critsec" supported="vulkan" ratified="vulkan">
            <require>
                <enum value="6" name="VK_KHR_WIN32_SURFACE_SPEC_VERSION"/>
                <enum value="&quot;VK_KHR_win32_surface&quot;" name="VK_KHR_WIN32_SURFACE_EXTENSION_NAME"/>
                <enum offset="0" extends="VkStructureType" name="VK_STRUCTURE_TYPE_WIN32_SURFACE_CREATE_INFO_KHR"/>
                <type name="VkWin32SurfaceCreateInfoKHR"/>
                <command name="vkCreateWin32SurfaceKHR"/>
            </require>
        </extension>
"#,
        );
    }

    for i in 0..f.extensions {
        let name = feature_extension(i);
        writeln!(
            x,
            r#"        <extension name="{name}" number="{number}" type="device" depends="VK_VERSION_1_1" author="EXT" contact="Someone @someone" supported="vulkan" ratified="vulkan">
            <require>
                <enum value="{spec_version}" name="{upper}_SPEC_VERSION"/>
                <enum value="&quot;{name}&quot;" name="{upper}_EXTENSION_NAME"/>
                <enum offset="0" extends="VkStructureType" name="{s_type}"/>
                <type name="{s_name}"/>"#,
            name = name,
            number = 100 + i,
            spec_version = i + 1,
            upper = name.to_uppercase(),
            s_type = feature_s_type(i),
            s_name = feature_struct(i)
        )
        .unwrap();
        if i == 0 {
            x.push_str(
                r#"                <enum bitpos="2" extends="VkQueueFlagBits" name="VK_QUEUE_FEATURE0_BIT_EXT"/>
                <enum extends="VkStructureType" name="VK_STRUCTURE_TYPE_APPLICATION_INFO_EXT" alias="VK_STRUCTURE_TYPE_APPLICATION_INFO"/>
                <command name="vkCreateFenceEXT"/>
"#,
            );
        }
        x.push_str("            </require>\n        </extension>\n");
    }

    x.push_str(
        r#"        <extension name="VK_NV_disabled" number="500" type="device" author="NV" contact="Someone @someone" supported="disabled">
            <require>
                <enum value="0" name="VK_NV_DISABLED_SPEC_VERSION"/>
                <enum value="&quot;VK_NV_disabled&quot;" name="VK_NV_DISABLED_EXTENSION_NAME"/>
                <enum offset="0" extends="VkStructureType" name="VK_STRUCTURE_TYPE_DISABLED_NV"/>
                <type name="VkDisabledNV"/>
            </require>
        </extension>
        <extension name="VK_EXT_sc_only" number="600" type="device" author="EXT" contact="Someone @someone" supported="vulkansc">
            <require>
                <enum value="1" name="VK_EXT_SC_ONLY_SPEC_VERSION"/>
                <enum value="&quot;VK_EXT_sc_only&quot;" name="VK_EXT_SC_ONLY_EXTENSION_NAME"/>
            </require>
        </extension>
    </extensions>
</registry>
"#,
    );

    x
}

/// Writes a minimal Vulkan-Headers checkout with the given `vk.xml` under
/// `root` and returns `root`.
pub fn headers_tree(root: &Path, vk_xml: &str) -> PathBuf {
    let registry = root.join("registry");
    fs::create_dir_all(registry.join("spec_tools")).unwrap();
    fs::create_dir_all(root.join("include/vulkan")).unwrap();
    fs::write(registry.join("vk.xml"), vk_xml).unwrap();
    fs::write(registry.join("genvk.py"), "#!/usr/bin/python3\n").unwrap();
    fs::write(registry.join("spec_tools/util.py"), "# helpers\n").unwrap();
    fs::write(root.join("include/vulkan/vulkan_core.h"), "// not part of the registry\n").unwrap();
    root.to_path_buf()
}

/// Writes `vk_xml` as the registry file of a bundled registry directory.
pub fn registry_dir(dir: &Path, vk_xml: &str) -> PathBuf {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join("vk.xml"), vk_xml).unwrap();
    dir.to_path_buf()
}
