pub const WINDOW_SIZE: [u32; 2] = [1024, 768];
pub const WINDOW_TITLE: &str = "L14_FragmentShaders";
pub const CLEAR_COLOR: [f32; 4] = [0.2, 0.3, 0.3, 1.0];

pub const COLOR_UNIFORM: &str = "ourColor";
pub const RESOLUTION_UNIFORM: &str = "iResolution";
pub const TIME_UNIFORM: &str = "iTime";

/// Two triangles covering the whole viewport, xyz per vertex.
pub const QUAD_VERTICES: [f32; 18] = [
    1.0, -1.0, 0.0,
    -1.0, -1.0, 0.0,
    -1.0, 1.0, 0.0,

    -1.0, 1.0, 0.0,
    1.0, 1.0, 0.0,
    1.0, -1.0, 0.0,
];
pub const QUAD_VERTEX_COUNT: i32 = (QUAD_VERTICES.len() / 3) as i32;

pub const VERTEX_SHADER_SOURCE: &str = r#"
layout (location = 0) in vec3 aPos;

void main() {
    gl_Position = vec4(aPos, 1.0);
}
"#;

pub const GRADIENT_FRAGMENT_SOURCE: &str = r#"
out vec4 frag_color;

uniform vec4 ourColor;
uniform vec2 iResolution;

void main() {
    vec2 st = gl_FragCoord.xy / iResolution;
    vec3 color = vec3(distance(st, vec2(0.5)));
    color.x = clamp(color.z, 0.0, 1.0);
    frag_color = ourColor + vec4(color, 1.0);
}
"#;

pub const PLASMA_FRAGMENT_SOURCE: &str = r#"
out vec4 frag_color;

uniform vec4 ourColor;
uniform vec2 iResolution;
uniform float iTime;

void main() {
    vec2 st = gl_FragCoord.xy / iResolution;
    vec2 p = st * 8.0 - 4.0;

    float v = sin(p.x + iTime);
    v += sin((p.y + iTime) * 0.5);
    v += sin((p.x + p.y + iTime) * 0.5);
    p += vec2(sin(iTime / 3.0), cos(iTime / 2.0)) * 2.0;
    v += sin(sqrt(dot(p, p) + 1.0) + iTime);
    v *= 0.5;

    vec3 plasma = vec3(sin(v * 3.14159), sin(v * 3.14159 + 2.094), sin(v * 3.14159 + 4.188)) * 0.5 + 0.5;
    frag_color = vec4(plasma * ourColor.rgb, ourColor.a);
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_covers_viewport_corners() {
        let corners: Vec<[f32; 2]> = QUAD_VERTICES
            .chunks_exact(3)
            .map(|v| [v[0], v[1]])
            .collect();

        assert_eq!(corners.len(), 6);
        for corner in [[-1.0, -1.0], [1.0, -1.0], [-1.0, 1.0], [1.0, 1.0]] {
            assert!(corners.contains(&corner), "missing corner {corner:?}");
        }
        assert!(QUAD_VERTICES.chunks_exact(3).all(|v| v[2] == 0.0));
    }

    #[test]
    fn fragment_sources_declare_host_uniforms() {
        for source in [GRADIENT_FRAGMENT_SOURCE, PLASMA_FRAGMENT_SOURCE] {
            assert!(source.contains(&format!("uniform vec4 {COLOR_UNIFORM};")));
            assert!(source.contains(&format!("uniform vec2 {RESOLUTION_UNIFORM};")));
        }
        assert!(PLASMA_FRAGMENT_SOURCE.contains(&format!("uniform float {TIME_UNIFORM};")));
        assert!(!GRADIENT_FRAGMENT_SOURCE.contains(TIME_UNIFORM));
    }

    #[test]
    fn sources_leave_version_to_the_compiler() {
        for source in [VERTEX_SHADER_SOURCE, GRADIENT_FRAGMENT_SOURCE, PLASMA_FRAGMENT_SOURCE] {
            assert!(!source.contains("#version"));
        }
    }
}
