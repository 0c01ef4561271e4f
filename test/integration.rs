// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use crate::ProjectFixture;

use sisgen::{
    deploy::{apply_directives, Platform, ResolveOptions},
    path::{to_forward_slashes, HostFileSystem},
    project::{PackageGenerator, Project},
    uid::UidCache,
};

use anyhow::Result;
use pretty_assertions::assert_eq;
use sealed_test::prelude::*;
use std::{
    env::current_dir,
    fs::read_to_string,
    path::PathBuf,
};

fn fixture() -> Result<ProjectFixture> {
    let fixture = ProjectFixture::new(current_dir()?)?;
    let sdk = to_forward_slashes(fixture.root().join("sdk"));

    fixture.write_file(
        "helloworld.toml",
        format!(
            r#"
            [project]
            target = "helloworld"
            uid3 = "0xE1234567"
            version = "1.2"
            manufacturers = ["0x101F6F88"]
            localize_deployment = true
            translations = ["i18n/helloworld_fi.ts", "i18n/helloworld_de.ts"]

            [toolchain]
            epoc_root = "{sdk}"
            smart_installer = "/opt/smartinstaller.sis"

            [rules]
            platforms = ['[0x1028315F],0,0,0,{{"S60ProductID"}}']

            [[deployment]]
            name = "assets"
            sources = ["assets"]
            path = "data"

            [deployment.pkg_prerules]
            common = ["platforms", '(0x2002AC89),0,1,0,{{"QtMobility"}}']
            stub = ["; stub rule"]

            [[deployment]]
            name = "plugins"
            sources = ["myplugin.dll"]
            path = "/resource/qt/plugins"

            [[deployment]]
            name = "readme"
            sources = ["readme.txt"]
            flags = ["FT", "TC"]
            "#
        ),
    )?;
    fixture.write_file("assets/a.txt", "asset")?;
    fixture.write_file("readme.txt", "read me")?;
    fixture.write_translation("i18n/helloworld_fi.ts", "Hei", "Hei maailma")?;
    fixture.write_translation("i18n/helloworld_de.ts", "Hallo", "Hallo Welt")?;

    Ok(fixture)
}

#[sealed_test]
fn generate_package_files() -> Result<()> {
    let fixture = fixture()?;
    let root = fixture.root().to_path_buf();
    let fwd_root = to_forward_slashes(&root);
    let out = root.join("out");

    let fs = HostFileSystem::new();
    let project = Project::load(&fs, root.join("helloworld.toml"), &mut UidCache::new())?;
    let artifacts = PackageGenerator::new(&fs, &out)
        .with_timestamp("2025-01-01T00:00:00")
        .generate(&project);

    let expect: Vec<PathBuf> = [
        "pluginstubs/myplugin.qtplugin",
        "helloworld_manufacturer_note.txt",
        "helloworld_template.pkg",
        "helloworld_installer.pkg",
        "helloworld_stub.pkg",
        "helloworld_reg.rss",
        "helloworld.rss",
        "helloworld.loc",
    ]
    .into_iter()
    .map(|name| out.join(name))
    .collect();
    assert_eq!(artifacts.files(), expect.as_slice());
    assert_eq!(artifacts.dirs(), &[out.join("pluginstubs")]);

    let main = read_to_string(out.join("helloworld_template.pkg"))?;
    let lines = [
        "; helloworld_template.pkg generated by sisgen at 2025-01-01T00:00:00".to_string(),
        "&09,03".into(),
        r#"#{"Hei maailma","Hallo Welt"},(0xE1234567),1,2,0"#.into(),
        r#"%{"Vendor","Vendor"}"#.into(),
        r#"[0x1028315F],0,0,0,{"S60ProductID"}"#.into(),
        r#"(0x2002AC89),0,1,0,{"QtMobility"}"#.into(),
        "IF (MANUFACTURER)=(0x101F6F88)".into(),
        format!(r#""{fwd_root}/sdk/epoc32/release/$(PLATFORM)/$(TARGET)/helloworld.exe" - "!:/sys/bin/helloworld.exe""#),
        format!(r#""{fwd_root}/sdk/epoc32/data/z/resource/apps/helloworld.rsc" - "!:/resource/apps/helloworld.rsc""#),
        format!(r#""{fwd_root}/sdk/epoc32/data/z/resource/apps/helloworld.r09" - "!:/resource/apps/helloworld.r09""#),
        format!(r#""{fwd_root}/sdk/epoc32/data/z/private/10003a3f/import/apps/helloworld_reg.r03" - "!:/private/10003a3f/import/apps/helloworld_reg.r03""#),
        format!(r#""{fwd_root}/assets/a.txt" - "!:/private/e1234567/data/assets/a.txt""#),
        format!(r#""{fwd_root}/sdk/epoc32/release/$(PLATFORM)/$(TARGET)/myplugin.dll" - "!:/sys/bin/myplugin.dll""#),
        format!(r#""{fwd_root}/out/pluginstubs/myplugin.qtplugin" - "!:/resource/qt/plugins/myplugin.qtplugin""#),
        format!(r#""{fwd_root}/readme.txt" - "",FT,TC"#),
        format!(r#""{fwd_root}/out/helloworld_manufacturer_note.txt" - "", FILETEXT, TEXTEXIT"#),
        "ENDIF ; MANUFACTURER".into(),
    ];
    for line in &lines {
        assert!(main.lines().any(|candidate| candidate == line.as_str()), "missing {line:?} in:\n{main}");
    }
    assert!(!main.contains("myplugin.dll\" - \"!:/resource/qt/plugins"));

    let stub = read_to_string(out.join("helloworld_stub.pkg"))?;
    assert!(stub.contains("; stub rule\n"));
    assert!(stub.contains("\"\" - \"z:/sys/bin/helloworld.exe\"\n"));
    assert!(stub.contains("\"\" - \"z:/resource/qt/plugins/myplugin.qtplugin\"\n"));
    assert!(!stub.contains("readme.txt"));
    assert!(!stub.contains("[0x1028315F]"));
    assert!(!stub.contains("(0x2002AC89)"));
    assert!(!stub.contains("MANUFACTURER"));

    let installer = read_to_string(out.join("helloworld_installer.pkg"))?;
    assert!(installer.contains(
        "#{\"Hei maailma installer\",\"Hallo Welt installer\"},(0xA000D7CE),1,2,0\n"
    ));
    assert!(installer.contains("[0x1028315F],0,0,0,{\"S60ProductID\"}\n"));
    assert!(!installer.contains("(0x2002AC89)"));
    assert!(installer.contains("@\"/opt/smartinstaller.sis\",(0x2002CCCD)\n"));
    assert!(installer.contains(&format!(
        "\"{fwd_root}/out/helloworld.sis\" - \"!:/private/2002CCCE/import/helloworld.sis\"\n"
    )));
    assert!(!installer.contains("; DEPLOYMENT"));

    let loc = read_to_string(out.join("helloworld.loc"))?;
    assert!(loc.contains("#elif defined LANGUAGE_09\n#define STRING_r_short_caption \"Hei\"\n"));
    assert!(loc.contains("#elif defined LANGUAGE_03\n#define STRING_r_short_caption \"Hallo\"\n"));

    let note = read_to_string(out.join("helloworld_manufacturer_note.txt"))?;
    assert_eq!(note, "Package is not compatible with this device.\n");

    Ok(())
}

#[sealed_test]
fn deploy_to_emulator_and_apply() -> Result<()> {
    let fixture = fixture()?;
    let root = fixture.root().to_path_buf();
    let fwd_root = to_forward_slashes(&root);
    let out = root.join("out");

    let fs = HostFileSystem::new();
    let project = Project::load(&fs, root.join("helloworld.toml"), &mut UidCache::new())?;
    let opts = ResolveOptions {
        target_path: format!("{fwd_root}/staging/"),
        deploy_binaries: false,
        full_system_build: true,
        platform: Platform::Emulator,
        build: "udeb".into(),
    };
    let resolution = project.resolve(&fs, &out, &opts);

    let destinations: Vec<String> = resolution
        .directives
        .iter()
        .map(|directive| directive.to.clone())
        .collect();
    assert_eq!(
        destinations,
        vec![
            format!("{fwd_root}/staging/data/assets/a.txt"),
            format!("{fwd_root}/sdk/epoc32/release/winscw/udeb/z/resource/qt/plugins/myplugin.qtplugin"),
            format!("{fwd_root}/staging/readme.txt"),
        ]
    );

    let copied = apply_directives(&fs, &resolution.directives);
    assert_eq!(copied, 3);
    assert_eq!(read_to_string(root.join("staging/data/assets/a.txt"))?, "asset");
    assert_eq!(read_to_string(root.join("staging/readme.txt"))?, "read me");
    assert!(
        read_to_string(root.join("sdk/epoc32/release/winscw/udeb/z/resource/qt/plugins/myplugin.qtplugin"))?
            .starts_with("This file is a plugin stub file.")
    );

    let release = ResolveOptions {
        build: "urel".into(),
        ..opts
    };
    let resolution = project.resolve(&fs, &out, &release);
    assert_eq!(resolution.directives.len(), 3);
    assert_eq!(
        resolution.directives[1].to,
        format!("{fwd_root}/sdk/epoc32/release/winscw/urel/z/resource/qt/plugins/myplugin.qtplugin")
    );

    Ok(())
}

#[sealed_test]
fn default_target_path_per_platform() -> Result<()> {
    let fixture = ProjectFixture::new(current_dir()?)?;
    let root = fixture.root().to_path_buf();
    let fwd_root = to_forward_slashes(&root);
    fixture.write_file(
        "mylib.toml",
        format!(
            r#"
            [project]
            target = "mylib"
            template = "lib"
            uid3 = "0xE1234567"

            [toolchain]
            epoc_root = "{fwd_root}/sdk"

            [[deployment]]
            name = "data"
            sources = ["a.txt"]
            path = "data"
            "#
        ),
    )?;
    fixture.write_file("a.txt", "a")?;

    let fs = HostFileSystem::new();
    let project = Project::load(&fs, root.join("mylib.toml"), &mut UidCache::new())?;
    let out = root.join("out");

    let cases = [
        (Platform::Emulator, format!("{fwd_root}/sdk/epoc32/winscw/c/private/e1234567/data/a.txt")),
        (Platform::Rom, format!("{fwd_root}/sdk/epoc32/data/z/private/e1234567/data/a.txt")),
        (Platform::Device("armv5".into()), "c:/private/e1234567/data/a.txt".to_string()),
    ];
    for (platform, expect) in cases {
        let opts = ResolveOptions {
            target_path: project.default_target_path(&platform),
            deploy_binaries: false,
            full_system_build: true,
            platform: platform.clone(),
            build: "udeb".into(),
        };
        let resolution = project.resolve(&fs, &out, &opts);
        let destinations: Vec<&str> = resolution
            .directives
            .iter()
            .map(|directive| directive.to.as_str())
            .collect();
        assert_eq!(destinations, vec![expect.as_str()]);

        if platform != Platform::Device("armv5".into()) {
            assert_eq!(apply_directives(&fs, &resolution.directives), 1);
            assert_eq!(read_to_string(&expect)?, "a");
        }
    }

    Ok(())
}
